use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum FinanzaError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown institution: {0}")]
    UnknownInstitution(String),

    #[error("Invalid scope: {0} (expected general, YYYY or YYYY-MM)")]
    InvalidScope(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FinanzaError>;
