//! Session-scoped storage for downloaded artifacts.
//!
//! Every session owns one temporary directory. Each stored artifact gets a
//! fresh, uniquely named file inside it, and the whole directory is removed
//! when the store is dropped. A cache keyed by `(file_id, suffix)` lets the
//! same remote file be materialized once per session.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary, session-owned artifact directory.
#[derive(Debug)]
pub struct ArtifactStore {
    dir: TempDir,
    cache: HashMap<(String, String), PathBuf>,
}

impl ArtifactStore {
    /// Creates a store under the system temp directory.
    pub fn new() -> std::io::Result<Self> {
        Self::from_dir(tempfile::Builder::new().prefix("testa-session-").tempdir()?)
    }

    /// Creates a store under `parent`, creating `parent` if needed.
    pub fn in_dir(parent: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(parent)?;
        Self::from_dir(
            tempfile::Builder::new()
                .prefix("testa-session-")
                .tempdir_in(parent)?,
        )
    }

    fn from_dir(dir: TempDir) -> std::io::Result<Self> {
        tracing::debug!("[ArtifactStore] Session artifacts at {:?}", dir.path());
        Ok(Self {
            dir,
            cache: HashMap::new(),
        })
    }

    /// Directory holding this session's artifacts.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a previously stored artifact.
    pub fn cached(&self, file_id: &str, suffix: &str) -> Option<&Path> {
        self.cache
            .get(&(file_id.to_string(), suffix.to_string()))
            .map(PathBuf::as_path)
    }

    /// Writes `bytes` to a new uniquely named file ending in `.{suffix}`.
    ///
    /// The file lives until the store is dropped.
    pub fn store(&mut self, file_id: &str, suffix: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let extension = if suffix.is_empty() {
            String::new()
        } else {
            format!(".{suffix}")
        };

        let mut file = tempfile::Builder::new()
            .prefix("artifact-")
            .suffix(&extension)
            .tempfile_in(self.dir.path())?;
        file.write_all(bytes)?;
        file.flush()?;
        let (_, path) = file.keep().map_err(|e| e.error)?;

        tracing::debug!(
            "[ArtifactStore] Stored {} ({} bytes) at {:?}",
            file_id,
            bytes.len(),
            path
        );
        self.cache
            .insert((file_id.to_string(), suffix.to_string()), path.clone());
        Ok(path)
    }

    /// Number of artifacts stored.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_writes_bytes_with_suffix() {
        let mut store = ArtifactStore::new().unwrap();
        let path = store.store("file-1", "csv", b"a,b\n1,2\n").unwrap();

        assert!(path.starts_with(store.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1,2\n");
        assert_eq!(store.cached("file-1", "csv"), Some(path.as_path()));
        assert!(store.cached("file-1", "png").is_none());
    }

    #[test]
    fn test_each_store_gets_unique_file() {
        let mut store = ArtifactStore::new().unwrap();
        let first = store.store("file-1", "png", b"one").unwrap();
        let second = store.store("file-2", "png", b"two").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_empty_suffix() {
        let mut store = ArtifactStore::new().unwrap();
        let path = store.store("file-1", "", b"raw").unwrap();
        assert!(path.extension().is_none());
    }

    #[test]
    fn test_drop_removes_directory() {
        let parent = TempDir::new().unwrap();
        let (dir, file) = {
            let mut store = ArtifactStore::in_dir(&parent.path().join("artifacts")).unwrap();
            let file = store.store("file-1", "csv", b"x").unwrap();
            (store.path().to_path_buf(), file)
        };
        assert!(!file.exists());
        assert!(!dir.exists());
    }
}
