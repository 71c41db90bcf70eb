//! Secret configuration file storage.
//!
//! Provides loading of secret configuration from ~/.config/testa/secret.json.

use crate::paths::TestaPaths;
use std::fs;
use std::path::PathBuf;
use testa_core::TestaError;
use testa_core::config::SecretConfig;

/// Environment variable holding the token key when secret.json has none.
pub const ENV_TOKEN_KEY: &str = "TESTA_TOKEN_KEY";

/// Errors that can occur during secret storage operations.
#[derive(Debug)]
pub enum SecretStorageError {
    /// Configuration file not found.
    NotFound(PathBuf),
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON parsing error.
    ParseError(serde_json::Error),
    /// Config directory not found.
    ConfigDirNotFound,
}

impl std::fmt::Display for SecretStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStorageError::NotFound(path) => {
                write!(f, "Configuration file not found at: {}", path.display())
            }
            SecretStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            SecretStorageError::ParseError(e) => write!(f, "JSON parse error: {}", e),
            SecretStorageError::ConfigDirNotFound => {
                write!(f, "Could not determine home directory")
            }
        }
    }
}

impl std::error::Error for SecretStorageError {}

impl From<std::io::Error> for SecretStorageError {
    fn from(e: std::io::Error) -> Self {
        SecretStorageError::IoError(e)
    }
}

impl From<serde_json::Error> for SecretStorageError {
    fn from(e: serde_json::Error) -> Self {
        SecretStorageError::ParseError(e)
    }
}

/// Storage for the secret configuration file (secret.json).
///
/// Read-only. The file holds the key that decrypts session tokens; API keys
/// themselves arrive inside the token and are never stored.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates a new SecretStorage with the default path (~/.config/testa/secret.json).
    pub fn new() -> Result<Self, SecretStorageError> {
        let path = TestaPaths::secret_file().map_err(|_| SecretStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    /// Creates a new SecretStorage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the secret configuration from the JSON file.
    ///
    /// # Returns
    ///
    /// - `Ok(SecretConfig)`: Successfully loaded and parsed
    /// - `Err(SecretStorageError::NotFound)`: File doesn't exist
    /// - `Err(SecretStorageError::IoError)`: Failed to read file
    /// - `Err(SecretStorageError::ParseError)`: Invalid JSON format
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    /// Returns the path to the secret file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Resolves the token key.
    ///
    /// Priority:
    /// 1. `token_key` in secret.json
    /// 2. `TESTA_TOKEN_KEY` environment variable
    pub fn resolve_token_key(&self) -> Result<String, TestaError> {
        resolve_token_key(self.load().ok(), std::env::var(ENV_TOKEN_KEY).ok())
    }
}

fn resolve_token_key(
    file: Option<SecretConfig>,
    env: Option<String>,
) -> Result<String, TestaError> {
    file.and_then(|config| config.token_key)
        .or(env)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            TestaError::config(format!(
                "token key not found in secret.json or {ENV_TOKEN_KEY}"
            ))
        })
}
