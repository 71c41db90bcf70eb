//! Configuration models.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration (`config.toml`). Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub poll: PollConfig,
    /// Parent directory for session artifact directories; system temp if unset.
    pub artifact_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll: PollConfig::default(),
            artifact_dir: None,
        }
    }
}

/// Bounds for waiting on a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 500,
            max_interval_ms: 5_000,
            multiplier: 2.0,
            max_attempts: 120,
            timeout_secs: 600,
        }
    }
}

impl PollConfig {
    /// Delay to sleep after the `attempt`-th (0-based) unsuccessful poll.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
        let millis = (self.initial_interval_ms as f64 * factor).min(self.max_interval_ms as f64);
        Duration::from_millis(millis as u64)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Secrets (`secret.json`).
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct SecretConfig {
    /// URL-safe base64 encoded 32-byte key used to decrypt session tokens.
    #[serde(default)]
    pub token_key: Option<String>,
}

impl std::fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretConfig")
            .field("token_key", &self.token_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
