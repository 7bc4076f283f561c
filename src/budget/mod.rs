//! Budget module - cost estimation and the spend gate.
//!
//! # Key Concepts
//! - Accountant: converts tokens to an estimated cost and decides whether to proceed
//! - Confirm: the interactive yes/no channel consulted once the ceiling is crossed

mod accountant;
mod confirm;

pub use accountant::{BudgetDecision, CostAccountant};
pub use confirm::{Confirm, StdinConfirm};

#[cfg(test)]
pub(crate) use confirm::FixedConfirm;
