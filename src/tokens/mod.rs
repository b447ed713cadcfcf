//! Token 用量与成本估算模块：累计 Token 用量并按模型价格表计算费用。
//!
//! # Token Usage and Cost Estimation Module
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TokenUsage`] | Prompt / completion token counters reported by the endpoint |
//! | [`ModelPricing`] | Price per 1000 tokens for one model, input and output priced independently |
//! | [`PriceTable`] | Model → pricing lookup with a default-model fallback |
//! | [`CostEstimate`] | Estimated cost breakdown |
//!
//! ## Example
//!
//! ```rust
//! use ai_batch_rust::tokens::PriceTable;
//!
//! let table = PriceTable::default();
//! let estimate = table.estimate("gpt-4o-mini", 2000, 3000);
//! assert!((estimate.total_cost - 2.10).abs() < 1e-9);
//! ```

mod pricing;

pub use pricing::{CostEstimate, ModelPricing, PriceTable, DEFAULT_PRICING_MODEL};

use serde::{Deserialize, Serialize};

/// Token counters for one completion (or a running total).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }
}
