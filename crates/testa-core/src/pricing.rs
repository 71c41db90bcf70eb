//! Cost model for assistant runs.
//!
//! Prices are expressed in dollars per 1K tokens. Models missing from the
//! table are not an error: they simply contribute nothing to cost totals.
//!
//! | Model ID | Input / 1K | Output / 1K |
//! |----------|-----------:|------------:|
//! | `gpt-3.5-turbo` | 0.0005 | 0.0015 |
//! | `gpt-4o` | 0.005 | 0.015 |
//! | `gpt-4-turbo` | 0.01 | 0.03 |
//! | `gpt-4.1-nano` | 0.0001 | 0.0004 |
//! | `gpt-4.1-mini` | 0.0004 | 0.0016 |
//! | `gpt-4` | 0.03 | 0.06 |

use serde::Serialize;

/// Words covered by 1K tokens when estimating human-facing prices.
const WORDS_PER_1K_TOKENS: u32 = 750;

/// Per-1K-token prices for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPrice {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl ModelPrice {
    const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Raw cost of a run in "per-1K units".
    ///
    /// The result must be divided by 1000 to obtain dollars; totals are kept
    /// in this unit and only scaled once at display time.
    pub fn raw_cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        self.input_per_1k * prompt_tokens as f64 + self.output_per_1k * completion_tokens as f64
    }
}

/// Static price table.
pub const MODEL_PRICES: &[(&str, ModelPrice)] = &[
    ("gpt-3.5-turbo", ModelPrice::new(0.0005, 0.0015)),
    ("gpt-4o", ModelPrice::new(0.005, 0.015)),
    ("gpt-4-turbo", ModelPrice::new(0.01, 0.03)),
    ("gpt-4.1-nano", ModelPrice::new(0.0001, 0.0004)),
    ("gpt-4.1-mini", ModelPrice::new(0.0004, 0.0016)),
    ("gpt-4", ModelPrice::new(0.03, 0.06)),
];

/// Looks up the prices for `model`. Exact match only.
pub fn price_for(model: &str) -> Option<ModelPrice> {
    MODEL_PRICES
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, price)| *price)
}

/// Formats a per-1K-token price as an estimate per 750,000 words.
///
/// 1K tokens are assumed to cover 750 words, so 750,000 words cost
/// `unit_price * 1000`.
pub fn format_price(unit_price: f64) -> String {
    format!(
        "${:.2} per {} words",
        unit_price * 1000.0,
        thousands(WORDS_PER_1K_TOKENS as u64 * 1000)
    )
}

/// Formats an accumulated raw cost (per-1K units) as a dollar string.
pub fn format_total(raw_cost: f64) -> String {
    format!("${:.2}", raw_cost / 1000.0)
}

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
