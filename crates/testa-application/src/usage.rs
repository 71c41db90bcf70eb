//! Token usage and cost accumulation over a thread's runs.

use serde::Serialize;
use testa_core::Result;
use testa_core::assistant::{AssistantService, Run};
use testa_core::pricing;
use testa_core::session::Session;

/// Running totals over a set of runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    /// Cost in per-1K units; divide by 1000 for dollars.
    pub raw_price: f64,
    pub total_tokens: u64,
}

impl UsageTotals {
    /// Adds one run.
    ///
    /// Tokens always count. Cost is added only for priced models; runs
    /// without usage (still in progress) contribute nothing.
    pub fn add_run(&mut self, run: &Run) {
        let Some(usage) = run.usage else {
            return;
        };
        self.total_tokens += usage.total_tokens;
        if let Some(price) = pricing::price_for(&run.model) {
            self.raw_price += price.raw_cost(usage.prompt_tokens, usage.completion_tokens);
        }
    }

    /// Dollar amount.
    pub fn price(&self) -> f64 {
        self.raw_price / 1000.0
    }

    /// Currency string with two decimals, e.g. `$0.01`.
    pub fn formatted_price(&self) -> String {
        pricing::format_total(self.raw_price)
    }
}

impl<'a> FromIterator<&'a Run> for UsageTotals {
    fn from_iter<I: IntoIterator<Item = &'a Run>>(iter: I) -> Self {
        let mut totals = UsageTotals::default();
        for run in iter {
            totals.add_run(run);
        }
        totals
    }
}

/// Recomputes session totals from the full run list of a thread.
pub struct UsageAccumulator;

impl UsageAccumulator {
    /// Sums usage over every run on `thread_id`.
    ///
    /// Always a full recomputation, never incremental, so calling it twice
    /// without new runs yields identical totals.
    pub async fn accumulate(service: &dyn AssistantService, thread_id: &str) -> Result<UsageTotals> {
        let runs = service.list_runs(thread_id).await?;
        let totals: UsageTotals = runs.iter().collect();
        tracing::debug!(
            "[UsageAccumulator] Thread {}: {} runs, {} tokens, {}",
            thread_id,
            runs.len(),
            totals.total_tokens,
            totals.formatted_price()
        );
        Ok(totals)
    }

    /// Writes totals into the session.
    pub fn apply(session: &mut Session, totals: &UsageTotals) {
        session.total_price = totals.formatted_price();
        session.total_tokens = totals.total_tokens;
    }
}
