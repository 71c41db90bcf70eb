//! SessionContext - the owned state of one chat session.
//!
//! Holds the service handle, the session record, the session-scoped
//! artifact store and the poll settings. Every operation that talks to the
//! remote service goes through a `&mut SessionContext`, so one session is
//! never mutated from two places at once.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use testa_core::assistant::{AssistantService, FileObject};
use testa_core::config::{AppConfig, PollConfig};
use testa_core::pricing;
use testa_core::session::Session;
use testa_core::token::{FileDescriptor, SessionToken};
use testa_core::{Result, TestaError};
use testa_infrastructure::ArtifactStore;
use tokio_util::sync::CancellationToken;

use crate::artifact_fetcher::{ArtifactFetcher, DEFAULT_SUFFIX};
use crate::normalizer::MessageNormalizer;
use crate::orchestrator::{ExchangeOutcome, RunOrchestrator};

/// Debug trace label for the assistant metadata.
pub const DEBUG_ASSISTANT: &str = "assistant";
/// Debug trace label for the session's input files.
pub const DEBUG_ID_FILES: &str = "id_files";

/// Human-readable prices of the session's model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPrices {
    pub model: String,
    pub input: String,
    pub output: String,
}

pub struct SessionContext {
    pub(crate) service: Arc<dyn AssistantService>,
    pub(crate) session: Session,
    pub(crate) artifacts: ArtifactStore,
    pub(crate) poll: PollConfig,
    assistant_files: Vec<FileObject>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session.id)
            .field("assistant_id", &self.session.assistant_id)
            .field("thread_id", &self.session.thread_id())
            .field("artifacts", &self.artifacts.path())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Wraps an existing session without contacting the service.
    pub fn new(
        service: Arc<dyn AssistantService>,
        session: Session,
        artifacts: ArtifactStore,
        poll: PollConfig,
    ) -> Self {
        Self {
            service,
            session,
            artifacts,
            poll,
            assistant_files: Vec::new(),
        }
    }

    /// Opens a session from a decoded token.
    ///
    /// Fails with [`TestaError::InvalidToken`] when the assistant cannot be
    /// retrieved; such a session is unusable.
    pub async fn open(
        token: SessionToken,
        service: Arc<dyn AssistantService>,
        config: &AppConfig,
    ) -> Result<Self> {
        let assistant = service
            .retrieve_assistant(&token.assistant)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "[SessionContext] Assistant {} could not be retrieved: {}",
                    token.assistant,
                    e
                );
                TestaError::invalid_token(format!("assistant '{}' is not accessible", token.assistant))
            })?;

        let artifacts = match &config.artifact_dir {
            Some(parent) => ArtifactStore::in_dir(parent)?,
            None => ArtifactStore::new()?,
        };

        let mut session = Session::new(token.assistant, token.file_ids);
        session.debug.push(DEBUG_ASSISTANT, &assistant);
        session.debug.push(DEBUG_ID_FILES, &session.input_files);

        let mut assistant_files = Vec::new();
        for file_id in assistant.code_interpreter_file_ids() {
            match service.retrieve_file(file_id).await {
                Ok(file) => assistant_files.push(file),
                Err(e) => {
                    tracing::warn!("[SessionContext] Skipping assistant file {}: {}", file_id, e);
                }
            }
        }

        tracing::info!(
            "[SessionContext] Opened session {} for assistant {} ({}), {} input files, {} assistant files",
            session.id,
            assistant.id,
            assistant.model,
            session.input_files.len(),
            assistant_files.len()
        );
        session.assistant = Some(assistant);

        Ok(Self {
            service,
            session,
            artifacts,
            poll: config.poll.clone(),
            assistant_files,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Files attached to the assistant's code interpreter.
    pub fn assistant_files(&self) -> &[FileObject] {
        &self.assistant_files
    }

    pub fn artifact_dir(&self) -> &std::path::Path {
        self.artifacts.path()
    }

    /// Runs one exchange. See [`RunOrchestrator::ask`].
    pub async fn ask(&mut self, prompt: &str, cancel: &CancellationToken) -> Result<ExchangeOutcome> {
        RunOrchestrator::ask(self, prompt, cancel).await
    }

    /// Rebuilds messages and totals from the remote thread.
    pub async fn refresh(&mut self) -> Result<()> {
        MessageNormalizer::refresh(self).await
    }

    /// Continues an existing remote thread and loads its history.
    ///
    /// On failure the session is left without a thread.
    pub async fn resume(&mut self, thread_id: &str) -> Result<()> {
        self.session.reset_thread();
        self.session.bind_thread(thread_id)?;
        if let Err(e) = self.refresh().await {
            tracing::warn!("[SessionContext] Could not resume thread {}: {}", thread_id, e);
            self.session.reset_thread();
            return Err(e);
        }
        tracing::info!(
            "[SessionContext] Resumed thread {} with {} messages",
            thread_id,
            self.session.messages.len()
        );
        Ok(())
    }

    /// Starts a new conversation; the next exchange creates a fresh thread.
    pub fn reset_thread(&mut self) -> Option<String> {
        let previous = self.session.reset_thread();
        if let Some(thread_id) = &previous {
            tracing::info!("[SessionContext] Left thread {}", thread_id);
        }
        previous
    }

    /// Downloads an input data file and returns its local path.
    pub async fn load_input_file(&mut self, file: &FileDescriptor) -> Result<PathBuf> {
        ArtifactFetcher::fetch(self.service.as_ref(), &mut self.artifacts, &file.id, DEFAULT_SUFFIX).await
    }

    /// Prices of the assistant's model, or `None` for an unpriced model.
    pub fn model_prices(&self) -> Option<ModelPrices> {
        let model = self.session.model()?;
        let price = pricing::price_for(model)?;
        Some(ModelPrices {
            model: model.to_string(),
            input: pricing::format_price(price.input_per_1k),
            output: pricing::format_price(price.output_per_1k),
        })
    }
}
