use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const TOKEN_VALIDITY_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountState {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "activa")]
    Active,
    #[serde(rename = "bloqueada")]
    Blocked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub name: String,
    pub permissions: Vec<String>,
}

impl Role {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub state: AccountState,
    pub roles: Vec<Role>,
}

impl User {
    /// Unsalted hex SHA-256. Kept for compatibility with existing user files;
    /// not a password-storage scheme to rely on.
    pub fn hash_password(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn verify_password(&self, password: &str) -> bool {
        self.password_hash == Self::hash_password(password)
    }

    #[cfg(test)]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.roles
            .iter()
            .any(|r| r.permissions.iter().any(|p| p == permission))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationToken {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl ConfirmationToken {
    pub fn generate(user_id: &str, now: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            token: hex::encode(bytes),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + Duration::hours(TOKEN_VALIDITY_HOURS),
            used: false,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.created_at <= now && now <= self.expires_at
    }
}
