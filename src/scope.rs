use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Datelike;

use crate::error::{FinanzaError, Result};

pub const GENERAL_DB: &str = "general.db";

/// Which database file a command works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    General,
    Year(i32),
    Month(i32, u32),
}

impl Scope {
    pub fn current_month() -> Self {
        let today = chrono::Local::now();
        Scope::Month(today.year(), today.month())
    }

    pub fn file_name(&self) -> String {
        match self {
            Scope::General => GENERAL_DB.to_string(),
            Scope::Year(y) => format!("{y:04}.db"),
            Scope::Month(y, m) => format!("{y:04}-{m:02}.db"),
        }
    }

    pub fn path_in(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }

    pub fn is_general(&self) -> bool {
        matches!(self, Scope::General)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::General => write!(f, "general"),
            Scope::Year(y) => write!(f, "{y:04}"),
            Scope::Month(y, m) => write!(f, "{y:04}-{m:02}"),
        }
    }
}

impl FromStr for Scope {
    type Err = FinanzaError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.eq_ignore_ascii_case("general") {
            return Ok(Scope::General);
        }
        let invalid = || FinanzaError::InvalidScope(raw.to_string());
        match raw.split_once('-') {
            Some((y, m)) => {
                let year: i32 = y.parse().map_err(|_| invalid())?;
                let month: u32 = m.parse().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
                Ok(Scope::Month(year, month))
            }
            None => raw.parse().map(Scope::Year).map_err(|_| invalid()),
        }
    }
}

pub fn general_path(data_dir: &Path) -> PathBuf {
    Scope::General.path_in(data_dir)
}

/// Every `*.db` file in `data_dir` except the general database, sorted by name.
pub fn period_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_db = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("db"));
        let is_general = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.eq_ignore_ascii_case(GENERAL_DB));
        if is_db && !is_general {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scopes() {
        assert_eq!("general".parse::<Scope>().unwrap(), Scope::General);
        assert_eq!("GENERAL".parse::<Scope>().unwrap(), Scope::General);
        assert_eq!("2025".parse::<Scope>().unwrap(), Scope::Year(2025));
        assert_eq!("2025-11".parse::<Scope>().unwrap(), Scope::Month(2025, 11));
        assert_eq!("2025-3".parse::<Scope>().unwrap(), Scope::Month(2025, 3));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("twenty".parse::<Scope>().is_err());
        assert!("2025-13".parse::<Scope>().is_err());
        assert!("2025-00".parse::<Scope>().is_err());
        assert!("2025-ab".parse::<Scope>().is_err());
    }

    #[test]
    fn test_file_names() {
        assert_eq!(Scope::General.file_name(), "general.db");
        assert_eq!(Scope::Year(2025).file_name(), "2025.db");
        assert_eq!(Scope::Month(2025, 3).file_name(), "2025-03.db");
        assert_eq!(Scope::Month(2025, 3).to_string(), "2025-03");
    }

    #[test]
    fn test_period_files_skip_general() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["General.db", "2025.db", "2025-01.db", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let files: Vec<String> = period_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["2025-01.db", "2025.db"]);
    }

    #[test]
    fn test_period_files_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(period_files(&dir.path().join("nope")).unwrap().is_empty());
    }
}
