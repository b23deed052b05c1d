use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{AccountState, ConfirmationToken, Role, User};
use crate::error::{FinanzaError, Result};

/// Everything the credential store persists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub users: BTreeMap<String, User>,
    pub tokens: HashMap<String, ConfirmationToken>,
}

pub trait UserRepository {
    fn load(&self) -> Result<Snapshot>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

// On-disk layout of the users file: id -> record, Spanish keys.
#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    nombre: String,
    email: String,
    password_hash: String,
    estado: AccountState,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    usuario_id: String,
    fecha_creacion: String,
    fecha_vencimiento: String,
    #[serde(default)]
    usado: bool,
}

/// Users in `users_db.json`, pending confirmation tokens next to it in
/// `users_db.tokens.json`.
pub struct JsonFileRepository {
    users_path: PathBuf,
    tokens_path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(users_path: &Path) -> Self {
        Self {
            users_path: users_path.to_path_buf(),
            tokens_path: users_path.with_extension("tokens.json"),
        }
    }

    #[cfg(test)]
    pub fn users_path(&self) -> &Path {
        &self.users_path
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FinanzaError::Other(format!("Invalid timestamp in token store: {raw} ({e})")))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

impl UserRepository for JsonFileRepository {
    fn load(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::default();

        if self.users_path.exists() {
            let content = std::fs::read_to_string(&self.users_path)?;
            let records: BTreeMap<String, UserRecord> = serde_json::from_str(&content)?;
            for (id, r) in records {
                let user = User {
                    id: id.clone(),
                    name: r.nombre,
                    email: r.email,
                    password_hash: r.password_hash,
                    state: r.estado,
                    roles: r.roles.into_iter().map(Role::named).collect(),
                };
                snapshot.users.insert(id, user);
            }
        }

        if self.tokens_path.exists() {
            let content = std::fs::read_to_string(&self.tokens_path)?;
            let records: HashMap<String, TokenRecord> = serde_json::from_str(&content)?;
            for (token, r) in records {
                let parsed = ConfirmationToken {
                    token: token.clone(),
                    user_id: r.usuario_id,
                    created_at: parse_timestamp(&r.fecha_creacion)?,
                    expires_at: parse_timestamp(&r.fecha_vencimiento)?,
                    used: r.usado,
                };
                snapshot.tokens.insert(token, parsed);
            }
        }

        tracing::debug!(
            users = snapshot.users.len(),
            tokens = snapshot.tokens.len(),
            "loaded credential store"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let users: BTreeMap<&str, UserRecord> = snapshot
            .users
            .iter()
            .map(|(id, u)| {
                (
                    id.as_str(),
                    UserRecord {
                        nombre: u.name.clone(),
                        email: u.email.clone(),
                        password_hash: u.password_hash.clone(),
                        estado: u.state,
                        roles: u.roles.iter().map(|r| r.name.clone()).collect(),
                    },
                )
            })
            .collect();
        write_json(&self.users_path, &users)?;

        let tokens: BTreeMap<&str, TokenRecord> = snapshot
            .tokens
            .iter()
            .map(|(t, tok)| {
                (
                    t.as_str(),
                    TokenRecord {
                        usuario_id: tok.user_id.clone(),
                        fecha_creacion: tok.created_at.to_rfc3339(),
                        fecha_vencimiento: tok.expires_at.to_rfc3339(),
                        usado: tok.used,
                    },
                )
            })
            .collect();
        write_json(&self.tokens_path, &tokens)
    }
}

/// Keeps the snapshot in memory.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryRepository {
    snapshot: std::cell::RefCell<Snapshot>,
}

#[cfg(test)]
impl MemoryRepository {
    pub fn stored(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }
}

#[cfg(test)]
impl UserRepository for MemoryRepository {
    fn load(&self) -> Result<Snapshot> {
        Ok(self.snapshot.borrow().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.snapshot.borrow_mut() = snapshot.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.users.insert(
            "user-1".into(),
            User {
                id: "user-1".into(),
                name: "Ana".into(),
                email: "ana@example.com".into(),
                password_hash: User::hash_password("secreto"),
                state: AccountState::Pending,
                roles: vec![Role::named("admin")],
            },
        );
        let token = ConfirmationToken::generate("user-1", Utc::now());
        snapshot.tokens.insert(token.token.clone(), token);
        snapshot
    }

    #[test]
    fn test_json_file_layout_uses_spanish_keys() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(&dir.path().join("users_db.json"));
        repo.save(&sample_snapshot()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(repo.users_path()).unwrap()).unwrap();
        assert_eq!(raw["user-1"]["nombre"], "Ana");
        assert_eq!(raw["user-1"]["estado"], "pendiente");
        assert_eq!(raw["user-1"]["roles"][0], "admin");
        assert!(dir.path().join("users_db.tokens.json").exists());
    }

    #[test]
    fn test_json_file_reload() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(&dir.path().join("nested").join("users_db.json"));
        let snapshot = sample_snapshot();
        repo.save(&snapshot).unwrap();

        let loaded = repo.load().unwrap();
        assert_eq!(loaded.users, snapshot.users);
        let (key, token) = loaded.tokens.iter().next().unwrap();
        let saved = &snapshot.tokens[key];
        assert_eq!(token.user_id, saved.user_id);
        assert_eq!(token.expires_at.timestamp(), saved.expires_at.timestamp());
    }

    #[test]
    fn test_reads_file_without_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_db.json");
        std::fs::write(
            &path,
            r#"{"user-1": {"nombre": "Ana", "email": "a@b.c", "password_hash": "x", "estado": "activa"}}"#,
        )
        .unwrap();
        let loaded = JsonFileRepository::new(&path).load().unwrap();
        assert_eq!(loaded.users["user-1"].state, AccountState::Active);
        assert!(loaded.users["user-1"].roles.is_empty());
        assert!(loaded.tokens.is_empty());
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = JsonFileRepository::new(&dir.path().join("users_db.json"))
            .load()
            .unwrap();
        assert_eq!(loaded, Snapshot::default());
    }
}
