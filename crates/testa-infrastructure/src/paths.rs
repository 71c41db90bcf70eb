//! Unified path management for testa configuration files.

use std::path::PathBuf;

const APP_DIR: &str = "testa";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for testa.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/testa/             # Config directory (platform config dir)
/// ├── config.toml              # Application configuration
/// ├── secret.json              # Token decryption key
/// └── logs/                    # Application logs
///     └── testa.log.YYYY-MM-DD
/// ```
///
/// Downloaded artifacts never live here: they go to a per-session
/// temporary directory that is removed when the session ends.
pub struct TestaPaths;

impl TestaPaths {
    /// Returns the testa configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Returns the log directory.
    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}
