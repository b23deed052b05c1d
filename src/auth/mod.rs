//! Local credential store.
//!
//! Users register, confirm with a one-time token (valid 24 hours) and log in
//! with email and password. State lives in a [`UserStore`] built over an
//! injected repository; nothing is loaded implicitly.

mod models;
mod repository;
mod store;

use thiserror::Error;

pub use repository::JsonFileRepository;
pub use store::UserStore;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired or already used")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is not active")]
    Inactive,
}
