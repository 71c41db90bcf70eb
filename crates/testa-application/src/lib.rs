//! Session lifecycle for the testa chat front-end.
//!
//! A [`SessionContext`] owns one chat session. Asking a question goes through
//! the [`RunOrchestrator`], which waits for the remote run and then lets the
//! [`MessageNormalizer`] rebuild the message list and usage totals.

pub mod artifact_fetcher;
pub mod normalizer;
pub mod orchestrator;
pub mod session_context;
pub mod usage;

#[cfg(test)]
mod testing;

pub use artifact_fetcher::ArtifactFetcher;
pub use normalizer::MessageNormalizer;
pub use orchestrator::{ExchangeOutcome, RunOrchestrator, wait_for_terminal};
pub use session_context::{ModelPrices, SessionContext};
pub use usage::{UsageAccumulator, UsageTotals};
