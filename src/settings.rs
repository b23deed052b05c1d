use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FinanzaError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Credential store; relative to `data_dir` when not absolute.
    #[serde(default = "default_users_file")]
    pub users_file: String,
}

fn default_currency() -> String {
    "ARS".to_string()
}

fn default_users_file() -> String {
    "users_db.json".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            default_currency: default_currency(),
            users_file: default_users_file(),
        }
    }
}

impl Settings {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn users_path(&self) -> PathBuf {
        let path = Path::new(&self.users_file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("finanza")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {e}");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    save_settings_to(settings, &settings_path())
}

fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| FinanzaError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// Settings for this invocation: the saved file, with `--data-dir` on top.
pub fn resolve(data_dir_override: Option<&str>) -> Settings {
    let mut settings = load_settings();
    if let Some(dir) = data_dir_override {
        settings.data_dir = shellexpand_path(dir);
    }
    settings
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/finanza".to_string(),
            default_currency: "USD".to_string(),
            users_file: "/tmp/users.json".to_string(),
        };
        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.data_dir, "/tmp/finanza");
        assert_eq!(loaded.default_currency, "USD");
        assert_eq!(loaded.users_path(), PathBuf::from("/tmp/users.json"));
    }

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(s.data_dir, "data");
        assert_eq!(s.default_currency, "ARS");
        assert_eq!(s.users_path(), PathBuf::from("data").join("users_db.json"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/srv/finanzas"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.default_currency, "ARS");
        assert_eq!(s.users_file, "users_db.json");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path).data_dir, "data");
    }
}
