//! Drives one question/answer exchange against the remote assistant.

use std::sync::Arc;
use std::time::Duration;
use testa_core::assistant::{AssistantService, MessageRole, Run, RunError, RunStatus};
use testa_core::config::PollConfig;
use testa_core::session::NormalizedMessage;
use testa_core::{Result, TestaError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::normalizer::MessageNormalizer;
use crate::session_context::SessionContext;

/// Result of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeOutcome {
    pub run_id: String,
    /// Terminal status the run ended in.
    pub status: RunStatus,
    /// Error reported by the service for a failed run.
    pub last_error: Option<RunError>,
    /// The refreshed message list, as stored in the session.
    pub messages: Vec<NormalizedMessage>,
}

impl ExchangeOutcome {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

pub struct RunOrchestrator;

impl RunOrchestrator {
    /// Posts `prompt` to the session's thread, runs the assistant and waits
    /// for the run to finish.
    ///
    /// The thread is created on first use and reused afterwards. Messages are
    /// refreshed exactly once after any terminal status, including `failed`.
    /// A poll timeout or cancellation skips the refresh and records the run
    /// as pending; the next call stops it before posting.
    pub async fn ask(
        ctx: &mut SessionContext,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<ExchangeOutcome> {
        let service = Arc::clone(&ctx.service);
        let thread_id = Self::ensure_thread(ctx).await?;
        Self::settle_pending_run(ctx, &thread_id, cancel).await?;

        service
            .create_message(&thread_id, MessageRole::User, prompt)
            .await?;
        let run = service
            .create_run(&thread_id, &ctx.session.assistant_id)
            .await?;
        tracing::info!("[RunOrchestrator] Started run {} on thread {}", run.id, thread_id);

        let run = match wait_for_terminal(service.as_ref(), &thread_id, &run.id, &ctx.poll, cancel).await {
            Ok(run) => run,
            Err(e) => {
                if e.is_interrupted() {
                    ctx.session.set_pending_run(run.id);
                }
                return Err(e);
            }
        };
        match run.status {
            RunStatus::Completed => {
                tracing::info!("[RunOrchestrator] Run {} completed", run.id);
            }
            status => {
                tracing::warn!(
                    "[RunOrchestrator] Run {} ended as {}: {}",
                    run.id,
                    status,
                    run.last_error
                        .as_ref()
                        .map(|e| e.message.as_str())
                        .unwrap_or("no error reported")
                );
            }
        }

        MessageNormalizer::refresh(ctx).await?;

        Ok(ExchangeOutcome {
            run_id: run.id,
            status: run.status,
            last_error: run.last_error,
            messages: ctx.session.messages.clone(),
        })
    }

    /// Brings a run left over from an interrupted wait to a terminal status.
    ///
    /// The service rejects new messages while a run is active, so the run is
    /// cancelled unless it already finished on its own.
    async fn settle_pending_run(
        ctx: &mut SessionContext,
        thread_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let Some(run_id) = ctx.session.pending_run().map(str::to_string) else {
            return Ok(());
        };
        let service = Arc::clone(&ctx.service);

        let run = service.retrieve_run(thread_id, &run_id).await?;
        if !run.status.is_terminal() {
            if run.status != RunStatus::Cancelling {
                tracing::info!("[RunOrchestrator] Cancelling unfinished run {}", run_id);
                if let Err(e) = service.cancel_run(thread_id, &run_id).await {
                    tracing::warn!("[RunOrchestrator] Cancel of run {} failed: {}", run_id, e);
                }
            }
            wait_for_terminal(service.as_ref(), thread_id, &run_id, &ctx.poll, cancel).await?;
        }

        tracing::debug!("[RunOrchestrator] Pending run {} settled", run_id);
        ctx.session.clear_pending_run();
        Ok(())
    }

    /// Returns the session's thread, creating and binding one if needed.
    async fn ensure_thread(ctx: &mut SessionContext) -> Result<String> {
        if let Some(thread_id) = ctx.session.thread_id() {
            return Ok(thread_id.to_string());
        }
        let thread = ctx.service.create_thread().await?;
        ctx.session.bind_thread(thread.id.clone())?;
        tracing::info!("[RunOrchestrator] Created thread {}", thread.id);
        Ok(thread.id)
    }
}

/// Polls a run until it reaches a terminal status.
///
/// Sleeps between polls with exponential backoff. Gives up with
/// [`TestaError::PollTimeout`] after `max_attempts` polls or once the overall
/// timeout elapses, even in the middle of a request, and returns
/// [`TestaError::Cancelled`] as soon as `cancel` fires. The remote run itself
/// is left alone in both cases.
pub async fn wait_for_terminal(
    service: &dyn AssistantService,
    thread_id: &str,
    run_id: &str,
    poll: &PollConfig,
    cancel: &CancellationToken,
) -> Result<Run> {
    let started = Instant::now();
    // A timeout too large to represent means no deadline.
    let deadline = started.checked_add(poll.timeout());
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let run = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(run_id, attempts)),
            run = service.retrieve_run(thread_id, run_id) => run?,
            _ = until(deadline) => return Err(timed_out(run_id, attempts, started, "no answer")),
        };

        if run.status.is_terminal() {
            tracing::debug!(
                "[RunOrchestrator] Run {} reached {} after {} polls",
                run_id,
                run.status,
                attempts
            );
            return Ok(run);
        }

        let now = Instant::now();
        if attempts >= poll.max_attempts || deadline.is_some_and(|d| now >= d) {
            return Err(timed_out(run_id, attempts, started, run.status.as_str()));
        }

        let backoff = poll.backoff(attempts - 1);
        let delay: Duration = deadline.map_or(backoff, |d| backoff.min(d - now));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(run_id, attempts)),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn timed_out(run_id: &str, attempts: u32, started: Instant, last_status: &str) -> TestaError {
    tracing::warn!(
        "[RunOrchestrator] Gave up on run {} after {} polls (last status {})",
        run_id,
        attempts,
        last_status
    );
    TestaError::PollTimeout {
        run_id: run_id.to_string(),
        attempts,
        elapsed: started.elapsed(),
    }
}

fn cancelled(run_id: &str, attempts: u32) -> TestaError {
    tracing::info!("[RunOrchestrator] Wait for run {} cancelled after {} polls", run_id, attempts);
    TestaError::Cancelled
}
