//! Fatal outcomes of a pipeline run.

use thiserror::Error;

use crate::artifact::RenderError;
use crate::llm::LlmError;

use super::CallError;

/// Everything that can end a run early. None of these are recovered from:
/// the top-level caller reports the error and exits.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stopping due to cost concerns before finishing '{stage}': projected ${projected_cost:.2} exceeds ceiling ${ceiling:.2}")]
    BudgetExceeded {
        stage: String,
        completed_stages: usize,
        projected_cost: f64,
        ceiling: f64,
    },

    #[error("Max retries reached at '{stage}' after {attempts} attempts: {source}")]
    ServiceUnavailable {
        stage: String,
        completed_stages: usize,
        attempts: u32,
        source: LlmError,
    },

    /// A stage referenced something that was never produced. Indicates a
    /// defect in a pipeline definition, not a runtime condition.
    #[error("Pipeline wiring error: {0}")]
    Wiring(String),

    #[error("Research failed: {0}")]
    Research(#[source] LlmError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// Attach the failing stage to a call error.
    pub(crate) fn from_call(stage: &str, completed_stages: usize, err: CallError) -> Self {
        match err {
            CallError::BudgetExceeded {
                projected_cost,
                ceiling,
                ..
            } => Self::BudgetExceeded {
                stage: stage.to_string(),
                completed_stages,
                projected_cost,
                ceiling,
            },
            CallError::ServiceUnavailable { attempts, source } => Self::ServiceUnavailable {
                stage: stage.to_string(),
                completed_stages,
                attempts,
                source,
            },
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BudgetExceeded { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_call_budget() {
        let err = PipelineError::from_call(
            "seo_feedback",
            2,
            CallError::BudgetExceeded {
                projected_cost: 1.5,
                ceiling: 1.0,
                total_tokens: 50_000,
            },
        );
        assert!(matches!(
            &err,
            PipelineError::BudgetExceeded { stage, completed_stages: 2, .. } if stage == "seo_feedback"
        ));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("$1.50"));
    }

    #[test]
    fn test_from_call_unavailable() {
        let err = PipelineError::from_call(
            "draft",
            0,
            CallError::ServiceUnavailable {
                attempts: 3,
                source: LlmError::connection("refused"),
            },
        );
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("after 3 attempts"));
    }
}
