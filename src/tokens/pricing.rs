//! Model pricing and cost estimation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Model whose prices apply when a model is missing from the table.
pub const DEFAULT_PRICING_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub model: String,
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
    pub currency: String,
}

impl ModelPricing {
    pub fn new(model: &str, input: f64, output: f64) -> Self {
        Self {
            model: model.into(),
            input_cost_per_1k: input,
            output_cost_per_1k: output,
            currency: "USD".into(),
        }
    }
    pub fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> CostEstimate {
        let ic = (input_tokens as f64 / 1000.0) * self.input_cost_per_1k;
        let oc = (output_tokens as f64 / 1000.0) * self.output_cost_per_1k;
        CostEstimate {
            model: self.model.clone(),
            input_tokens,
            output_tokens,
            input_cost: ic,
            output_cost: oc,
            total_cost: ic + oc,
            currency: self.currency.clone(),
        }
    }
    pub fn gpt_4o_mini() -> Self {
        Self::new("gpt-4o-mini", 0.15, 0.60)
    }
    pub fn gpt_4o() -> Self {
        Self::new("gpt-4o", 2.50, 10.00)
    }
    pub fn gpt_41() -> Self {
        Self::new("gpt-4.1", 2.00, 8.00)
    }
    pub fn gpt_41_mini() -> Self {
        Self::new("gpt-4.1-mini", 0.40, 1.60)
    }
    pub fn gpt_41_nano() -> Self {
        Self::new("gpt-4.1-nano", 0.10, 0.40)
    }
    pub fn gpt_35_turbo() -> Self {
        Self::new("gpt-3.5-turbo", 0.50, 1.50)
    }
}

/// Price lookup keyed by lowercase model id.
#[derive(Debug, Clone)]
pub struct PriceTable {
    entries: HashMap<String, ModelPricing>,
    default: ModelPricing,
}

impl PriceTable {
    pub fn empty(default: ModelPricing) -> Self {
        let mut entries = HashMap::new();
        entries.insert(default.model.to_lowercase(), default.clone());
        Self { entries, default }
    }

    /// Add or replace one model's pricing.
    pub fn with_model(mut self, pricing: ModelPricing) -> Self {
        if pricing.model.eq_ignore_ascii_case(&self.default.model) {
            self.default = pricing.clone();
        }
        self.entries.insert(pricing.model.to_lowercase(), pricing);
        self
    }

    pub fn get(&self, model: &str) -> Option<&ModelPricing> {
        self.entries.get(&model.to_lowercase())
    }

    /// Pricing for `model`, or the default model's pricing when unknown.
    pub fn resolve(&self, model: &str) -> &ModelPricing {
        self.get(model).unwrap_or(&self.default)
    }

    pub fn estimate(&self, model: &str, input_tokens: u64, output_tokens: u64) -> CostEstimate {
        let mut estimate = self.resolve(model).calculate_cost(input_tokens, output_tokens);
        // Report the model that was asked for, even when priced by fallback.
        estimate.model = model.to_string();
        estimate
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::empty(ModelPricing::gpt_4o_mini())
            .with_model(ModelPricing::gpt_4o())
            .with_model(ModelPricing::gpt_41())
            .with_model(ModelPricing::gpt_41_mini())
            .with_model(ModelPricing::gpt_41_nano())
            .with_model(ModelPricing::gpt_35_turbo())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
}

impl CostEstimate {
    pub fn format(&self) -> String {
        format!("{} {:.6}", self.currency, self.total_cost)
    }
    pub fn format_detailed(&self) -> String {
        if self.total_cost < 0.01 {
            format!("{:.4}¢", self.total_cost * 100.0)
        } else {
            format!("${:.4}", self.total_cost)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_gpt_4o_mini_cost() {
        let e = PriceTable::default().estimate("gpt-4o-mini", 2000, 3000);
        assert!(approx(e.input_cost, 0.30));
        assert!(approx(e.output_cost, 1.80));
        assert!(approx(e.total_cost, 2.10));
        assert_eq!(e.currency, "USD");
    }

    #[test]
    fn test_unknown_model_uses_default_pricing() {
        let table = PriceTable::default();
        let e = table.estimate("some-new-model", 1000, 1000);
        assert!(approx(e.total_cost, 0.15 + 0.60));
        assert_eq!(e.model, "some-new-model");
        assert_eq!(table.resolve("some-new-model").model, DEFAULT_PRICING_MODEL);
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_exact() {
        let table = PriceTable::default();
        assert_eq!(table.resolve("GPT-4o").model, "gpt-4o");
        // Exact match: a mini variant must not pick up gpt-4o prices.
        assert_eq!(table.resolve("gpt-4.1-mini").input_cost_per_1k, 0.40);
    }

    #[test]
    fn test_override_entry() {
        let table = PriceTable::default().with_model(ModelPricing::new("gpt-4o", 1.0, 2.0));
        let e = table.estimate("gpt-4o", 1000, 1000);
        assert!(approx(e.total_cost, 3.0));
    }

    #[test]
    fn test_zero_tokens_cost_nothing() {
        let e = PriceTable::default().estimate("gpt-4o", 0, 0);
        assert_eq!(e.total_cost, 0.0);
        assert_eq!(e.format(), "USD 0.000000");
    }

    #[test]
    fn test_format_detailed() {
        let cheap = ModelPricing::gpt_4o_mini().calculate_cost(10, 0);
        assert!(cheap.format_detailed().ends_with('¢'));
        let pricey = ModelPricing::gpt_4o().calculate_cost(1000, 1000);
        assert_eq!(pricey.format_detailed(), "$12.5000");
    }
}
