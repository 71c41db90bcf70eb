//! Downloads remote files into the session's artifact store.

use std::path::PathBuf;
use testa_core::Result;
use testa_core::assistant::AssistantService;
use testa_infrastructure::ArtifactStore;

/// Suffix used for input data files when none is given.
pub const DEFAULT_SUFFIX: &str = "csv";

/// Materializes remote files as local, session-scoped artifacts.
pub struct ArtifactFetcher;

impl ArtifactFetcher {
    /// Returns a local path holding the full contents of `file_id`.
    ///
    /// A file already fetched with the same suffix in this session is served
    /// from the store without another download. Download errors propagate
    /// unchanged and nothing is retried.
    pub async fn fetch(
        service: &dyn AssistantService,
        store: &mut ArtifactStore,
        file_id: &str,
        suffix: &str,
    ) -> Result<PathBuf> {
        if let Some(path) = store.cached(file_id, suffix) {
            tracing::debug!("[ArtifactFetcher] Cache hit for {}", file_id);
            return Ok(path.to_path_buf());
        }

        let bytes = service.file_content(file_id).await?;
        let path = store.store(file_id, suffix, &bytes)?;
        tracing::info!(
            "[ArtifactFetcher] Fetched {} ({} bytes) as .{}",
            file_id,
            bytes.len(),
            suffix
        );
        Ok(path)
    }
}
