//! Session token payload and decoder trait.
//!
//! A session is opened from an opaque token carried in the launch URL (or
//! passed on the command line). The decoded payload names the API key, the
//! assistant, and the input data files to show next to the chat.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// An input data file attached to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
}

/// Decoded session token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    /// API key for the remote service.
    pub key: String,
    /// Assistant id to converse with.
    pub assistant: String,
    #[serde(default)]
    pub file_ids: Vec<FileDescriptor>,
}

// Never print the API key.
impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("key", &"<redacted>")
            .field("assistant", &self.assistant)
            .field("file_ids", &self.file_ids)
            .finish()
    }
}

/// Decodes the opaque token string into a [`SessionToken`].
///
/// Any failure must be reported as [`crate::TestaError::InvalidToken`].
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, data: &str) -> Result<SessionToken>;
}
