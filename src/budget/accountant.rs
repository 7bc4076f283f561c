//! Token cost accounting and the confirmation gate.

use std::sync::Arc;

use crate::config::BudgetConfig;

use super::Confirm;

/// Outcome of a budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDecision {
    Proceed,
    Abort,
}

/// Converts token counts into an estimated cost and gates spend above the ceiling.
///
/// Holds no running total: callers pass the cumulative count in, so every
/// check is evaluated afresh against the ceiling.
pub struct CostAccountant {
    config: BudgetConfig,
    confirm: Arc<dyn Confirm>,
}

impl CostAccountant {
    pub fn new(config: BudgetConfig, confirm: Arc<dyn Confirm>) -> Self {
        Self { config, confirm }
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Estimated cost of `total_tokens`, linear in the token count.
    pub fn estimate_cost(&self, total_tokens: u64) -> f64 {
        (total_tokens as f64 / 1000.0) * self.config.cost_per_1k_tokens
    }

    /// Decide whether the run may continue after a call consumed `tokens_this_call`.
    ///
    /// Within the ceiling this never consults the confirmation channel.
    pub fn should_continue(&self, tokens_this_call: u64, cumulative_before: u64) -> BudgetDecision {
        let total = tokens_this_call.saturating_add(cumulative_before);
        let cost = self.estimate_cost(total);
        if cost <= self.config.max_cost {
            return BudgetDecision::Proceed;
        }

        tracing::info!(
            total_tokens = total,
            projected_cost = cost,
            max_cost = self.config.max_cost,
            "Projected cost exceeds ceiling, asking for confirmation"
        );
        if self.confirm.confirm(cost) {
            BudgetDecision::Proceed
        } else {
            BudgetDecision::Abort
        }
    }
}
