//! Application config file storage.
//!
//! Loads `config.toml` into [`AppConfig`], falling back to defaults when the
//! file is missing or empty, then applies environment overrides.

use std::fs;
use std::path::{Path, PathBuf};
use testa_core::TestaError;
use testa_core::config::AppConfig;

use crate::paths::TestaPaths;

/// Environment variable overriding `api_base_url`.
pub const ENV_API_BASE_URL: &str = "TESTA_API_BASE_URL";

/// Errors that can occur during config storage operations.
#[derive(Debug)]
pub enum ConfigStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// Config directory not found.
    ConfigDirNotFound,
}

impl std::fmt::Display for ConfigStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigStorageError::ConfigDirNotFound => {
                write!(f, "Could not determine home directory")
            }
        }
    }
}

impl std::error::Error for ConfigStorageError {}

impl From<std::io::Error> for ConfigStorageError {
    fn from(e: std::io::Error) -> Self {
        ConfigStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigStorageError {
    fn from(e: toml::de::Error) -> Self {
        ConfigStorageError::TomlParseError(e)
    }
}

impl From<ConfigStorageError> for TestaError {
    fn from(e: ConfigStorageError) -> Self {
        match e {
            ConfigStorageError::IoError(io) => io.into(),
            ConfigStorageError::TomlParseError(toml) => toml.into(),
            ConfigStorageError::ConfigDirNotFound => {
                TestaError::config("Could not determine home directory")
            }
        }
    }
}

/// Read-only storage for `config.toml`.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a storage for the default path (~/.config/testa/config.toml).
    pub fn new() -> Result<Self, ConfigStorageError> {
        let path = TestaPaths::config_file().map_err(|_| ConfigStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    /// Creates a storage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config file.
    ///
    /// # Returns
    ///
    /// - `Ok(AppConfig)`: Parsed config, or defaults if the file is missing or empty
    /// - `Err(ConfigStorageError)`: The file exists but could not be read or parsed
    pub fn load(&self) -> Result<AppConfig, ConfigStorageError> {
        if !self.path.exists() {
            tracing::debug!("[ConfigStorage] No config at {:?}, using defaults", self.path);
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Loads the config file and applies environment overrides.
    pub fn load_with_env(&self) -> Result<AppConfig, ConfigStorageError> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());
        Ok(config)
    }
}

fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
        config.api_base_url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use testa_core::config::DEFAULT_API_BASE_URL;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::with_path(temp_dir.path().join("config.toml"));
        assert_eq!(storage.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "  \n").unwrap();
        let storage = ConfigStorage::with_path(path);
        assert_eq!(storage.load().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
api_base_url = "http://localhost:8080/v1"
artifact_dir = "/var/tmp/testa"

[poll]
initial_interval_ms = 250
timeout_secs = 30
"#,
        )
        .unwrap();

        let config = ConfigStorage::with_path(path).load().unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/v1");
        assert_eq!(config.artifact_dir, Some(PathBuf::from("/var/tmp/testa")));
        assert_eq!(config.poll.initial_interval_ms, 250);
        assert_eq!(config.poll.timeout_secs, 30);
        assert_eq!(config.poll.max_attempts, 120);
    }

    #[test]
    fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "api_base_url = [").unwrap();

        let result = ConfigStorage::with_path(path).load();
        assert!(matches!(result, Err(ConfigStorageError::TomlParseError(_))));
    }

    #[test]
    fn test_env_override() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |_| Some(String::new()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);

        apply_env_overrides(&mut config, |name| {
            (name == ENV_API_BASE_URL).then(|| "http://127.0.0.1:9/v1".to_string())
        });
        assert_eq!(config.api_base_url, "http://127.0.0.1:9/v1");
    }
}
