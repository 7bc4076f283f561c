//! Per-run accumulator for stage outputs and token spend.

use super::PipelineError;

/// State of one pipeline run.
///
/// # Invariants
/// - `cumulative_tokens()` equals the sum of tokens recorded by completed stages
/// - each output key is written at most once; entries keep insertion order
#[derive(Debug, Clone)]
pub struct PipelineContext {
    directive: String,
    keyword: String,
    research: Option<String>,
    cumulative_tokens: u64,
    stage_outputs: Vec<(String, String)>,
}

impl PipelineContext {
    pub fn new(directive: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            keyword: keyword.into(),
            research: None,
            cumulative_tokens: 0,
            stage_outputs: Vec::new(),
        }
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Research report seeded before the first stage, if the pipeline uses one.
    pub fn research(&self) -> Option<&str> {
        self.research.as_deref()
    }

    pub fn cumulative_tokens(&self) -> u64 {
        self.cumulative_tokens
    }

    /// Output of a completed stage.
    pub fn output(&self, key: &str) -> Option<&str> {
        self.stage_outputs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, text)| text.as_str())
    }

    /// Completed stage outputs in the order they were produced.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stage_outputs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn completed_stages(&self) -> usize {
        self.stage_outputs.len()
    }

    pub(crate) fn set_research(&mut self, report: String) {
        self.research = Some(report);
    }

    /// Store a stage's output and add its tokens to the running total.
    pub(crate) fn record(
        &mut self,
        key: &str,
        text: String,
        tokens: u64,
    ) -> Result<(), PipelineError> {
        if self.output(key).is_some() {
            return Err(PipelineError::Wiring(format!(
                "stage output '{}' written twice",
                key
            )));
        }
        self.stage_outputs.push((key.to_string(), text));
        self.cumulative_tokens = self.cumulative_tokens.saturating_add(tokens);
        Ok(())
    }
}
