//! Filesystem and crypto adapters for testa.

pub mod artifact_store;
pub mod fernet;
pub mod paths;
pub mod storage;

pub use artifact_store::ArtifactStore;
pub use fernet::{FernetError, FernetKey, FernetTokenDecoder};
pub use paths::TestaPaths;
pub use storage::{ConfigStorage, SecretStorage};
