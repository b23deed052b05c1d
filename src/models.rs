use std::fmt;
use std::str::FromStr;

use crate::error::FinanzaError;

#[derive(Debug, Clone, PartialEq)]
pub struct Institution {
    pub id: i64,
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub institution_id: i64,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryType {
    In,
    Out,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = FinanzaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            other => Err(FinanzaError::Other(format!(
                "Invalid category type: {other} (must be IN or OUT)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<i64>,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub posted_at: String,
    pub description: String,
    pub amount: f64,
    pub currency: String,
    pub deleted_at: Option<String>,
}

/// Statement row after column mapping, before account resolution and insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub posted_at: String,
    pub account: String,
    pub description: String,
    pub amount: f64,
    pub currency: String,
}
