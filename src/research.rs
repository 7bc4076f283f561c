//! Research step run before pipelines that draft from a report.

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::{ChatMessage, LlmClient, LlmError};

const RESEARCHER_ROLE: &str = "You are a research assistant. Write a concise, factual summary report on the topic provided: key facts, current trends, notable figures and open debates, as a structured list of findings a writer can draw on.";

/// The report framed the way it is shown on the terminal.
pub fn research_banner(report: &str) -> String {
    format!(
        "\n=== Research Report ===\n\n{}\n\n=======================\n",
        report
    )
}

/// Produces a text report for a topic.
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, topic: &str) -> Result<String, LlmError>;
}

/// Researcher backed by the completion service.
///
/// Tokens spent here are logged but not part of the pipeline's budget.
pub struct LlmResearcher {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl LlmResearcher {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Researcher for LlmResearcher {
    async fn research(&self, topic: &str) -> Result<String, LlmError> {
        tracing::info!(topic, "Conducting research");
        let messages = [ChatMessage::system(RESEARCHER_ROLE), ChatMessage::user(topic)];
        let response = self.llm.chat_completion(&self.model, &messages).await?;

        if let Some(usage) = &response.usage {
            tracing::info!(tokens = usage.total_tokens, "Research complete");
        }
        response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::malformed("research report was empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;
    use crate::pipeline::testing::ScriptedLlm;

    #[test]
    fn test_research_banner_frames_report() {
        let banner = research_banner("- Monet\n- Renoir");
        let lines: Vec<&str> = banner.lines().collect();
        assert_eq!(
            lines,
            vec!["", "=== Research Report ===", "", "- Monet", "- Renoir", "", "======================="]
        );
    }

    #[tokio::test]
    async fn test_research_returns_report() {
        let llm = Arc::new(ScriptedLlm::replies(vec![("- Monet\n- Renoir", 80)]));
        let researcher = LlmResearcher::new(llm.clone(), "gpt-4");

        let report = researcher.research("Impressionist art trends").await.unwrap();

        assert_eq!(report, "- Monet\n- Renoir");
        let request = &llm.requests()[0];
        assert_eq!(request[0].content, RESEARCHER_ROLE);
        assert_eq!(request[1].content, "Impressionist art trends");
    }

    #[tokio::test]
    async fn test_empty_report_is_error() {
        let llm = Arc::new(ScriptedLlm::replies(vec![("   ", 5)]));
        let researcher = LlmResearcher::new(llm, "gpt-4");

        let err = researcher.research("topic").await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(LlmErrorKind::Authentication)]));
        let researcher = LlmResearcher::new(llm, "gpt-4");

        let err = researcher.research("topic").await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Authentication);
    }
}
