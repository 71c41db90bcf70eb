//! Remote assistant service trait.
//!
//! Defines the request/response contract the application consumes. The
//! HTTP implementation lives in `testa-interaction`; tests use in-memory
//! doubles.

use super::model::{Assistant, FileObject, MessageRole, Run, Thread, ThreadMessage};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract client for a hosted assistant conversation API.
///
/// Every method maps to exactly one remote operation (list operations may
/// page internally). Implementations must not retry on their own: errors are
/// surfaced to the caller as [`crate::TestaError::Remote`].
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Creates a new, empty conversation thread.
    async fn create_thread(&self) -> Result<Thread>;

    /// Appends a message to a thread.
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage>;

    /// Starts a run of `assistant_id` against the thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    /// Asks the service to stop a run. The run passes through `cancelling`
    /// before it settles.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Retrieves the current state of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Lists every run ever created on the thread.
    async fn list_runs(&self, thread_id: &str) -> Result<Vec<Run>>;

    /// Lists the full message history of the thread, oldest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;

    /// Downloads the full contents of a file.
    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>>;

    /// Retrieves file metadata.
    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject>;

    /// Retrieves assistant metadata.
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant>;
}
