//! Pipeline module - sequenced, budget-gated completion calls.
//!
//! # Flow
//! - `StageSequencer` walks a fixed `Pipeline` of `StageSpec`s
//! - each stage builds its payload from earlier outputs in the `PipelineContext`
//! - `CallExecutor` performs the call, retrying with a fixed delay, and checks
//!   the running spend with the `CostAccountant` before handing the result back
//!
//! Execution is strictly sequential: every stage depends on earlier outputs.

mod context;
mod error;
mod executor;
mod presets;
mod sequencer;
mod stage;

pub use context::PipelineContext;
pub use error::PipelineError;
pub use executor::{CallError, CallExecutor, CallResult, Sleeper, TokioSleeper};
pub use presets::{editorial, persona, PipelineKind};
pub use sequencer::{PipelineRun, ResearchHook, StageSequencer, HEADLINE_ROLE};
pub use stage::{Input, Pipeline, StageSpec, KEYWORD_PLACEHOLDER};

#[cfg(test)]
pub(crate) use executor::testing;
