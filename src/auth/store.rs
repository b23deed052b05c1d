use chrono::{DateTime, Utc};

use super::models::{AccountState, ConfirmationToken, User};
use super::repository::{Snapshot, UserRepository};
use super::AuthError;
use crate::error::Result;

/// Users and pending confirmation tokens, loaded from and written back to an
/// injected repository on every change.
pub struct UserStore<R: UserRepository> {
    repo: R,
    state: Snapshot,
}

impl<R: UserRepository> UserStore<R> {
    pub fn open(repo: R) -> Result<Self> {
        let state = repo.load()?;
        Ok(Self { repo, state })
    }

    #[cfg(test)]
    pub fn repository(&self) -> &R {
        &self.repo
    }

    #[cfg(test)]
    pub fn user(&self, id: &str) -> Option<&User> {
        self.state.users.get(id)
    }

    pub fn user_count(&self) -> usize {
        self.state.users.len()
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.state.users.values().find(|u| u.email == email)
    }

    /// `user-{n}` one past the highest numbered id, so gaps never reuse a key.
    fn next_user_id(&self) -> String {
        let highest = self
            .state
            .users
            .keys()
            .filter_map(|id| id.strip_prefix("user-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("user-{}", highest + 1)
    }

    pub fn register(&mut self, name: &str, email: &str, password: &str) -> Result<ConfirmationToken> {
        self.register_at(name, email, password, Utc::now())
    }

    pub fn register_at(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationToken> {
        if self.find_by_email(email).is_some() {
            return Err(AuthError::EmailTaken(email.to_string()).into());
        }

        let id = self.next_user_id();
        let user = User {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: User::hash_password(password),
            state: AccountState::Pending,
            roles: Vec::new(),
        };
        self.state.users.insert(id.clone(), user);

        let token = ConfirmationToken::generate(&id, now);
        self.state.tokens.insert(token.token.clone(), token.clone());
        self.repo.save(&self.state)?;

        tracing::info!(user = %id, "registered user pending confirmation");
        Ok(token)
    }

    pub fn confirm(&mut self, token: &str) -> Result<User> {
        self.confirm_at(token, Utc::now())
    }

    pub fn confirm_at(&mut self, token: &str, now: DateTime<Utc>) -> Result<User> {
        let entry = self
            .state
            .tokens
            .get_mut(token)
            .ok_or(AuthError::InvalidToken)?;
        if !entry.is_valid_at(now) {
            return Err(AuthError::TokenExpired.into());
        }
        let user = self
            .state
            .users
            .get_mut(&entry.user_id)
            .ok_or(AuthError::InvalidToken)?;

        user.state = AccountState::Active;
        entry.used = true;
        let confirmed = user.clone();
        self.repo.save(&self.state)?;

        tracing::info!(user = %confirmed.id, "account confirmed");
        Ok(confirmed)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<&User> {
        let user = self
            .find_by_email(email)
            .ok_or(AuthError::InvalidCredentials)?;
        if user.state != AccountState::Active {
            return Err(AuthError::Inactive.into());
        }
        if !user.verify_password(password) {
            tracing::warn!(user = %user.id, "failed login");
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::MemoryRepository;
    use crate::error::FinanzaError;
    use chrono::Duration;

    fn store() -> UserStore<MemoryRepository> {
        UserStore::open(MemoryRepository::default()).unwrap()
    }

    fn auth_err(err: FinanzaError) -> AuthError {
        match err {
            FinanzaError::Auth(e) => e,
            other => panic!("expected auth error, got {other}"),
        }
    }

    #[test]
    fn test_register_confirm_login() {
        let mut store = store();
        let token = store.register("Ana", "ana@example.com", "secreto").unwrap();
        assert_eq!(token.user_id, "user-1");
        assert_eq!(store.user("user-1").unwrap().state, AccountState::Pending);

        let user = store.confirm(&token.token).unwrap();
        assert_eq!(user.state, AccountState::Active);

        let logged = store.login("ana@example.com", "secreto").unwrap();
        assert_eq!(logged.id, "user-1");
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut store = store();
        store.register("Ana", "ana@example.com", "x").unwrap();
        let err = store.register("Otra", "ana@example.com", "y").unwrap_err();
        assert!(matches!(auth_err(err), AuthError::EmailTaken(_)));
    }

    #[test]
    fn test_login_requires_active_account() {
        let mut store = store();
        store.register("Ana", "ana@example.com", "secreto").unwrap();
        let err = store.login("ana@example.com", "secreto").unwrap_err();
        assert!(matches!(auth_err(err), AuthError::Inactive));
    }

    #[test]
    fn test_login_wrong_password_and_unknown_email() {
        let mut store = store();
        let token = store.register("Ana", "ana@example.com", "secreto").unwrap();
        store.confirm(&token.token).unwrap();

        let err = store.login("ana@example.com", "nope").unwrap_err();
        assert!(matches!(auth_err(err), AuthError::InvalidCredentials));
        let err = store.login("bob@example.com", "secreto").unwrap_err();
        assert!(matches!(auth_err(err), AuthError::InvalidCredentials));
    }

    #[test]
    fn test_token_cannot_be_reused_or_forged() {
        let mut store = store();
        let token = store.register("Ana", "ana@example.com", "secreto").unwrap();
        store.confirm(&token.token).unwrap();

        let err = store.confirm(&token.token).unwrap_err();
        assert!(matches!(auth_err(err), AuthError::TokenExpired));
        let err = store.confirm("not-a-token").unwrap_err();
        assert!(matches!(auth_err(err), AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token() {
        let mut store = store();
        let issued = Utc::now();
        let token = store
            .register_at("Ana", "ana@example.com", "secreto", issued)
            .unwrap();
        let err = store
            .confirm_at(&token.token, issued + Duration::hours(30))
            .unwrap_err();
        assert!(matches!(auth_err(err), AuthError::TokenExpired));
        assert_eq!(store.user("user-1").unwrap().state, AccountState::Pending);
    }

    #[test]
    fn test_register_after_id_gap_keeps_existing_users() {
        let mut store = store();
        store.register("Ana", "ana@example.com", "a").unwrap();
        store.register("Beto", "beto@example.com", "b").unwrap();
        store.register("Caro", "caro@example.com", "c").unwrap();
        store.state.users.remove("user-2");

        let token = store.register("Dani", "dani@example.com", "d").unwrap();
        assert_eq!(token.user_id, "user-4");
        assert_eq!(store.user_count(), 3);
        assert_eq!(store.user("user-3").unwrap().name, "Caro");
    }

    #[test]
    fn test_changes_reach_repository() {
        let mut store = store();
        let token = store.register("Ana", "ana@example.com", "secreto").unwrap();
        store.register("Beto", "beto@example.com", "clave").unwrap();
        store.confirm(&token.token).unwrap();

        assert_eq!(store.user_count(), 2);
        let stored = store.repository().stored();
        assert_eq!(stored.users.len(), 2);
        assert_eq!(stored.users["user-1"].state, AccountState::Active);
        assert!(stored.tokens[&token.token].used);
    }
}
