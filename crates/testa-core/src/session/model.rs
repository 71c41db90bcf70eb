//! In-memory session state.

use super::debug::DebugTrace;
use super::message::NormalizedMessage;
use crate::assistant::Assistant;
use crate::error::{Result, TestaError};
use crate::pricing;
use crate::token::FileDescriptor;
use serde::Serialize;
use uuid::Uuid;

/// State of one browser/terminal session.
///
/// There is exactly one `Session` per interactive session; it is created on
/// open and dropped with it. The remote service handle lives next to it in
/// the application layer's session context.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub created_at: String,
    pub assistant_id: String,
    pub assistant: Option<Assistant>,
    pub input_files: Vec<FileDescriptor>,
    thread_id: Option<String>,
    /// Run left unfinished by an interrupted wait.
    pending_run: Option<String>,
    pub messages: Vec<NormalizedMessage>,
    /// Currency-formatted total, e.g. `$0.01`.
    pub total_price: String,
    pub total_tokens: u64,
    pub debug: DebugTrace,
}

impl Session {
    pub fn new(assistant_id: impl Into<String>, input_files: Vec<FileDescriptor>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            assistant_id: assistant_id.into(),
            assistant: None,
            input_files,
            thread_id: None,
            pending_run: None,
            messages: Vec::new(),
            total_price: pricing::format_total(0.0),
            total_tokens: 0,
            debug: DebugTrace::new(),
        }
    }

    /// The active thread id, if a thread has been bound.
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Binds the session to a thread.
    ///
    /// A bound thread id is immutable: rebinding to the same id is a no-op,
    /// rebinding to a different one is an error until [`Session::reset_thread`].
    pub fn bind_thread(&mut self, thread_id: impl Into<String>) -> Result<()> {
        let thread_id = thread_id.into();
        match &self.thread_id {
            Some(current) if *current == thread_id => Ok(()),
            Some(current) => Err(TestaError::internal(format!(
                "session {} is already bound to thread {current}",
                self.id
            ))),
            None => {
                self.thread_id = Some(thread_id);
                Ok(())
            }
        }
    }

    /// Run on the bound thread that was still active when its wait was
    /// interrupted. The thread accepts no new messages until it finishes.
    pub fn pending_run(&self) -> Option<&str> {
        self.pending_run.as_deref()
    }

    pub fn set_pending_run(&mut self, run_id: impl Into<String>) {
        self.pending_run = Some(run_id.into());
    }

    pub fn clear_pending_run(&mut self) {
        self.pending_run = None;
    }

    /// Starts a new conversation: forgets the thread, its messages and totals.
    pub fn reset_thread(&mut self) -> Option<String> {
        self.pending_run = None;
        self.messages.clear();
        self.total_price = pricing::format_total(0.0);
        self.total_tokens = 0;
        self.thread_id.take()
    }

    /// Model configured on the assistant, once metadata has been loaded.
    pub fn model(&self) -> Option<&str> {
        self.assistant.as_ref().map(|a| a.model.as_str())
    }

    /// Display title: the assistant name, falling back to its id.
    pub fn title(&self) -> &str {
        self.assistant
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .unwrap_or(&self.assistant_id)
    }
}
