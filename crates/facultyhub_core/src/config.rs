//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Collect database, photo and logging locations in one place.
//! - Load them from `FACULTYHUB_*` environment variables with defaults.
//!
//! # Invariants
//! - `log_dir`, when set, must be absolute (the logging bootstrap requires it).
//! - `log_level` is one of `trace|debug|info|warn|error`.

use crate::logging::{default_log_level, normalize_level};
use crate::photo::FsPhotoStore;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "FACULTYHUB_DB_PATH";
pub const ENV_PHOTO_DIR: &str = "FACULTYHUB_PHOTO_DIR";
pub const ENV_LOG_LEVEL: &str = "FACULTYHUB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FACULTYHUB_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "facultyhub.sqlite3";
const DEFAULT_PHOTO_DIR: &str = "uploads";

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub photo_dir: PathBuf,
    pub log_level: String,
    /// Logging stays disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            photo_dir: PathBuf::from(DEFAULT_PHOTO_DIR),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Builds configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(value) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_PHOTO_DIR) {
            config.photo_dir = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field rules and normalizes the log level.
    pub fn validate(&mut self) -> Result<(), String> {
        self.log_level = normalize_level(&self.log_level)?.to_string();
        if let Some(dir) = self.log_dir.as_deref() {
            if !dir.is_absolute() {
                return Err(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                ));
            }
        }
        if self.db_path.as_os_str().is_empty() {
            return Err("db_path cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Photo store rooted at `photo_dir`.
    pub fn photo_store(&self) -> FsPhotoStore {
        FsPhotoStore::new(self.photo_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_PHOTO_DIR};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    #[test]
    fn from_lookup_uses_defaults_for_missing_and_blank_values() {
        let config = CoreConfig::from_lookup(lookup(&[(ENV_PHOTO_DIR, "  ")])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("facultyhub.sqlite3"));
        assert_eq!(config.photo_dir, PathBuf::from("uploads"));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn from_lookup_reads_and_normalizes_values() {
        let log_dir = std::env::temp_dir().join("facultyhub-config-test");
        let log_dir_text = log_dir.to_str().unwrap().to_string();
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/srv/records.sqlite3"),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_LOG_DIR, log_dir_text.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/srv/records.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir(), Some(log_dir.as_path()));
    }

    #[test]
    fn from_lookup_rejects_relative_log_dir_and_unknown_level() {
        let relative = CoreConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "logs")]))
            .expect_err("relative log dir must be rejected");
        assert!(relative.contains("absolute"));

        let level = CoreConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "verbose")]))
            .expect_err("unknown level must be rejected");
        assert!(level.contains("unsupported log level"));
    }

    #[test]
    fn deserialize_fills_missing_fields_with_defaults() {
        let json = r#"{"photo_dir": "/srv/photos", "log_level": "ERROR"}"#;
        let mut config: CoreConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.db_path, PathBuf::from("facultyhub.sqlite3"));
        assert_eq!(config.log_level, "error");
        assert!(config.log_dir.is_none());
        assert_eq!(config.photo_store().root(), Path::new("/srv/photos"));
    }

    #[test]
    fn photo_store_follows_photo_dir_from_env() {
        let config =
            CoreConfig::from_lookup(lookup(&[(ENV_PHOTO_DIR, "/var/lib/photos")])).unwrap();
        assert_eq!(config.photo_store().root(), Path::new("/var/lib/photos"));
    }
}
