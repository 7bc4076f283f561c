//! Single completion call with fixed-delay retry and the budget gate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::budget::{BudgetDecision, CostAccountant};
use crate::config::RetryPolicy;
use crate::llm::{ChatMessage, ChatResponse, LlmClient, LlmError};

/// Text and token usage from one successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub text: String,
    pub tokens: u64,
}

/// Why a call did not produce a usable result. Both variants end the run.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("projected cost ${projected_cost:.2} exceeds ceiling ${ceiling:.2} and was not approved")]
    BudgetExceeded {
        projected_cost: f64,
        ceiling: f64,
        total_tokens: u64,
    },

    #[error("completion service unavailable after {attempts} attempts: {source}")]
    ServiceUnavailable { attempts: u32, source: LlmError },
}

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleep.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Performs completion calls on behalf of the stage sequencer.
///
/// Stateless with respect to the run: the cumulative token count is passed in
/// on every call.
pub struct CallExecutor {
    llm: Arc<dyn LlmClient>,
    model: String,
    accountant: CostAccountant,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl CallExecutor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        accountant: CostAccountant,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            accountant,
            retry,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn accountant(&self) -> &CostAccountant {
        &self.accountant
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one exchange: system role instruction plus user payload.
    ///
    /// Every failure is retried the same way, `retry.attempts` times in total
    /// with `retry.delay` between attempts. A successful response is checked
    /// against the budget before it is returned.
    pub async fn execute(
        &self,
        role_instruction: &str,
        payload: &str,
        cumulative_tokens: u64,
    ) -> Result<CallResult, CallError> {
        let messages = [ChatMessage::system(role_instruction), ChatMessage::user(payload)];
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = self
                .llm
                .chat_completion(&self.model, &messages)
                .await
                .and_then(into_call_result);

            match outcome {
                Ok(result) => {
                    tracing::debug!(tokens = result.tokens, "API response: {}", result.text);
                    return self.gate(result, cumulative_tokens);
                }
                Err(err) if attempt >= attempts => {
                    tracing::error!(attempt, kind = %err.kind, "Max retries reached: {}", err.message);
                    return Err(CallError::ServiceUnavailable {
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        retries = attempts,
                        kind = %err.kind,
                        transient = err.kind.is_transient(),
                        delay_secs = self.retry.delay.as_secs(),
                        "Error communicating with completion service, retrying: {}",
                        err.message
                    );
                    self.sleeper.sleep(self.retry.delay).await;
                }
            }
        }
    }

    fn gate(&self, result: CallResult, cumulative_tokens: u64) -> Result<CallResult, CallError> {
        match self.accountant.should_continue(result.tokens, cumulative_tokens) {
            BudgetDecision::Proceed => Ok(result),
            BudgetDecision::Abort => {
                let total_tokens = result.tokens.saturating_add(cumulative_tokens);
                Err(CallError::BudgetExceeded {
                    projected_cost: self.accountant.estimate_cost(total_tokens),
                    ceiling: self.accountant.config().max_cost,
                    total_tokens,
                })
            }
        }
    }
}

fn into_call_result(response: ChatResponse) -> Result<CallResult, LlmError> {
    let usage = response
        .usage
        .ok_or_else(|| LlmError::malformed("response did not report token usage"))?;
    Ok(CallResult {
        text: response.content.unwrap_or_default(),
        tokens: usage.total_tokens,
    })
}
