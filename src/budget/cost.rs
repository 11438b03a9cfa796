//! Token usage pricing

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Dollars per million input tokens
pub const INPUT_COST_PER_MILLION: f64 = 0.25;
/// Dollars per million output tokens
pub const OUTPUT_COST_PER_MILLION: f64 = 1.25;
/// Output tokens count this many times against the provider quota
pub const OUTPUT_QUOTA_WEIGHT: u64 = 5;

/// Usage block as reported by the model provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub dollar_cost: f64,
    pub quota_consumed: u64,
}

/// Price a usage block. Missing or zero counts price to nothing.
pub fn calculate_cost(usage: &TokenUsage) -> CostBreakdown {
    let (input, output) = match (usage.input_tokens, usage.output_tokens) {
        (Some(i), Some(o)) if i > 0 && o > 0 => (i, o),
        _ => {
            warn!(?usage, "Usage data incomplete, counting zero cost");
            return CostBreakdown::default();
        }
    };

    let input_cost = input as f64 / 1_000_000.0 * INPUT_COST_PER_MILLION;
    let output_cost = output as f64 / 1_000_000.0 * OUTPUT_COST_PER_MILLION;

    CostBreakdown {
        input_tokens: input,
        output_tokens: output,
        input_cost,
        output_cost,
        dollar_cost: input_cost + output_cost,
        quota_consumed: output
            .saturating_mul(OUTPUT_QUOTA_WEIGHT)
            .saturating_add(input),
    }
}
