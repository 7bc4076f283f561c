//! Drives a pipeline stage by stage.

use std::sync::Arc;

use crate::research::Researcher;

use super::{CallExecutor, CallResult, Pipeline, PipelineContext, PipelineError};

/// Role used for the closing headline suggestion.
pub const HEADLINE_ROLE: &str = "You are a creative writer. Suggest a captivating title for the article. The audience are people interested in the art market.";

/// Called with the research report as soon as it arrives.
pub type ResearchHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub context: PipelineContext,
    /// Output of the final stage.
    pub result: String,
}

/// Runs every stage of a pipeline exactly once, in order.
///
/// # Task Processing Flow
/// ```text
/// 1. Seed the context (directive, keyword, research report if needed)
/// 2. For each stage: build payload -> execute -> record output and tokens
/// 3. Return the last stage's output
/// ```
pub struct StageSequencer {
    executor: CallExecutor,
    researcher: Option<Arc<dyn Researcher>>,
    on_research: Option<ResearchHook>,
}

impl StageSequencer {
    pub fn new(executor: CallExecutor) -> Self {
        Self {
            executor,
            researcher: None,
            on_research: None,
        }
    }

    pub fn with_researcher(mut self, researcher: Arc<dyn Researcher>) -> Self {
        self.researcher = Some(researcher);
        self
    }

    /// Show the research report (the binary prints it between banner lines).
    pub fn on_research(mut self, hook: ResearchHook) -> Self {
        self.on_research = Some(hook);
        self
    }

    pub fn executor(&self) -> &CallExecutor {
        &self.executor
    }

    /// Run the pipeline to completion or to the first fatal error.
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        directive: &str,
        keyword: &str,
    ) -> Result<PipelineRun, PipelineError> {
        let mut ctx = PipelineContext::new(directive, keyword);
        let run_id = uuid::Uuid::new_v4();
        tracing::info!(
            %run_id,
            pipeline = pipeline.name(),
            stages = pipeline.stages().len(),
            "Starting pipeline"
        );

        if pipeline.needs_research() {
            let researcher = self.researcher.as_ref().ok_or_else(|| {
                PipelineError::Wiring(format!(
                    "pipeline '{}' reads a research report but no researcher is configured",
                    pipeline.name()
                ))
            })?;
            let report = researcher
                .research(directive)
                .await
                .map_err(PipelineError::Research)?;
            tracing::info!(%run_id, "Research report:\n{}", report);
            if let Some(hook) = &self.on_research {
                hook(&report);
            }
            ctx.set_research(report);
        }

        for (index, stage) in pipeline.stages().iter().enumerate() {
            let payload = stage.build_payload(&ctx)?;
            let role = stage.role_instruction(&ctx);
            tracing::info!(%run_id, stage = stage.output_key(), index, "Running stage");

            let result = self
                .executor
                .execute(&role, &payload, ctx.cumulative_tokens())
                .await
                .map_err(|e| PipelineError::from_call(stage.output_key(), index, e))?;

            ctx.record(stage.output_key(), result.text, result.tokens)?;
            tracing::info!(
                %run_id,
                stage = stage.output_key(),
                tokens = result.tokens,
                cumulative_tokens = ctx.cumulative_tokens(),
                "Stage complete"
            );
        }

        let result = ctx
            .output(pipeline.result_key())
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::Wiring(format!("result '{}' missing", pipeline.result_key()))
            })?;
        Ok(PipelineRun {
            context: ctx,
            result,
        })
    }

    /// Ask for a title after the stages have run. Budget-gated like any stage,
    /// but its output is not part of the run's stage outputs.
    pub async fn suggest_headline(&self, run: &PipelineRun) -> Result<CallResult, PipelineError> {
        let ctx = &run.context;
        tracing::info!("Suggesting headline");
        self.executor
            .execute(HEADLINE_ROLE, ctx.directive(), ctx.cumulative_tokens())
            .await
            .map_err(|e| PipelineError::from_call("headline", ctx.completed_stages(), e))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::budget::{CostAccountant, FixedConfirm};
    use crate::config::{BudgetConfig, RetryPolicy};
    use crate::llm::{LlmError, LlmErrorKind};
    use crate::pipeline::executor::testing::{RecordingSleeper, ScriptedLlm};
    use crate::pipeline::{editorial, Input, StageSpec};
    use crate::research::research_banner;
    use async_trait::async_trait;

    fn sequencer(llm: Arc<ScriptedLlm>, confirm: Arc<FixedConfirm>, max_cost: f64) -> StageSequencer {
        let accountant = CostAccountant::new(
            BudgetConfig {
                cost_per_1k_tokens: 0.03,
                max_cost,
            },
            confirm,
        );
        let executor = CallExecutor::new(
            llm,
            "gpt-4",
            accountant,
            RetryPolicy {
                attempts: 3,
                delay: Duration::from_secs(10),
            },
        )
        .with_sleeper(Arc::new(RecordingSleeper::default()));
        StageSequencer::new(executor)
    }

    fn three_stage() -> Pipeline {
        Pipeline::new(
            "test",
            vec![
                StageSpec::new("draft", "writer")
                    .labelled("Prompt", Input::Directive)
                    .labelled("Keyword", Input::Keyword),
                StageSpec::new("feedback", "editor").input(Input::output("draft")),
                StageSpec::new("final", "writer")
                    .labelled("Original Draft", Input::output("draft"))
                    .labelled("Editor Feedback", Input::output("feedback")),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_runs_stages_in_order() {
        let llm = Arc::new(ScriptedLlm::replies(vec![
            ("first draft", 100),
            ("tighten intro", 20),
            ("final text", 150),
        ]));
        let seq = sequencer(llm.clone(), Arc::new(FixedConfirm::new(false)), 1.0);

        let run = seq.run(&three_stage(), "Monet", "impressionism").await.unwrap();

        assert_eq!(run.result, "final text");
        assert_eq!(run.context.cumulative_tokens(), 270);
        assert_eq!(run.context.completed_stages(), 3);

        let requests = llm.requests();
        assert_eq!(requests[0][1].content, "Prompt: Monet\nKeyword: impressionism");
        assert_eq!(requests[1][1].content, "first draft");
        assert_eq!(
            requests[2][1].content,
            "Original Draft: first draft\nEditor Feedback: tighten intro"
        );
    }

    #[tokio::test]
    async fn test_editorial_stage_inputs() {
        let llm = Arc::new(ScriptedLlm::replies(vec![
            ("D", 1),
            ("E", 1),
            ("S", 1),
            ("R", 1),
            ("SE", 1),
            ("F", 1),
        ]));
        let seq = sequencer(llm.clone(), Arc::new(FixedConfirm::new(false)), 1.0);

        let run = seq.run(&editorial().unwrap(), "dir", "kw").await.unwrap();

        let payloads: Vec<String> = llm
            .requests()
            .iter()
            .map(|request| request[1].content.clone())
            .collect();
        assert_eq!(
            payloads,
            vec![
                "Prompt: dir\nKeyword: kw",
                "D",
                "D",
                "Original Draft: D\nEditor Feedback: E\nSEO Feedback: S",
                "R",
                "Original Draft: R\nSenior Editor Feedback: SE",
            ]
        );
        assert!(llm.requests()[2][0].content.contains("keyword 'kw'"));
        assert_eq!(run.result, "F");
        assert_eq!(run.context.output("final_draft"), Some("F"));
        assert_eq!(run.context.cumulative_tokens(), 6);
    }

    #[tokio::test]
    async fn test_passes_cumulative_tokens_to_budget_gate() {
        // 0.03 per 1k, ceiling 0.01 => anything above 333 tokens needs confirmation.
        let llm = Arc::new(ScriptedLlm::replies(vec![
            ("a", 200),
            ("b", 100),
            ("c", 100),
        ]));
        let confirm = Arc::new(FixedConfirm::new(true));
        let seq = sequencer(llm, confirm.clone(), 0.01);

        let run = seq.run(&three_stage(), "d", "k").await.unwrap();

        // 200 and 300 stay under; 400 crosses.
        assert_eq!(confirm.calls(), 1);
        assert_eq!(run.context.cumulative_tokens(), 400);
    }

    #[tokio::test]
    async fn test_service_failure_stops_run() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(("draft".to_string(), 10)),
            Err(LlmErrorKind::Connection),
            Err(LlmErrorKind::Connection),
            Err(LlmErrorKind::Connection),
        ]));
        let seq = sequencer(llm.clone(), Arc::new(FixedConfirm::new(false)), 1.0);

        let err = seq.run(&three_stage(), "d", "k").await.unwrap_err();

        assert!(matches!(
            &err,
            PipelineError::ServiceUnavailable { stage, completed_stages: 1, attempts: 3, .. }
                if stage == "feedback"
        ));
        assert_eq!(llm.calls(), 4);
    }

    struct StaticResearcher;

    #[async_trait]
    impl Researcher for StaticResearcher {
        async fn research(&self, topic: &str) -> Result<String, LlmError> {
            Ok(format!("Findings on {}", topic))
        }
    }

    fn research_pipeline() -> Pipeline {
        Pipeline::new(
            "research",
            vec![StageSpec::new("draft", "writer")
                .labelled("Research Info", Input::Research)
                .labelled("Prompt", Input::Directive)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_research_is_seeded() {
        let llm = Arc::new(ScriptedLlm::replies(vec![("draft", 10)]));
        let seq = sequencer(llm.clone(), Arc::new(FixedConfirm::new(false)), 1.0)
            .with_researcher(Arc::new(StaticResearcher));

        let run = seq.run(&research_pipeline(), "Monet", "k").await.unwrap();

        assert_eq!(run.context.research(), Some("Findings on Monet"));
        assert_eq!(
            llm.requests()[0][1].content,
            "Research Info: Findings on Monet\nPrompt: Monet"
        );
    }

    #[tokio::test]
    async fn test_research_report_is_shown_before_first_stage() {
        let llm = Arc::new(ScriptedLlm::replies(vec![("draft", 10)]));
        let shown = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&shown);
        let calls_at_show = Arc::new(std::sync::Mutex::new(None));
        let calls_seen = Arc::clone(&calls_at_show);
        let llm_seen = Arc::clone(&llm);
        let seq = sequencer(llm.clone(), Arc::new(FixedConfirm::new(false)), 1.0)
            .with_researcher(Arc::new(StaticResearcher))
            .on_research(Arc::new(move |report: &str| {
                seen.lock().unwrap().push(research_banner(report));
                *calls_seen.lock().unwrap() = Some(llm_seen.calls());
            }));

        seq.run(&research_pipeline(), "Monet", "k").await.unwrap();

        let shown = shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].contains("=== Research Report ===\n\nFindings on Monet\n\n====="));
        assert_eq!(*calls_at_show.lock().unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_research_without_researcher_is_wiring_error() {
        let llm = Arc::new(ScriptedLlm::replies(vec![("draft", 10)]));
        let seq = sequencer(llm.clone(), Arc::new(FixedConfirm::new(false)), 1.0);

        let err = seq.run(&research_pipeline(), "d", "k").await.unwrap_err();

        assert!(matches!(err, PipelineError::Wiring(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_suggest_headline() {
        let llm = Arc::new(ScriptedLlm::replies(vec![
            ("a", 10),
            ("b", 10),
            ("c", 10),
            ("Light and Colour", 12),
        ]));
        let seq = sequencer(llm.clone(), Arc::new(FixedConfirm::new(false)), 1.0);

        let run = seq
            .run(&three_stage(), "Impressionist art trends", "impressionism")
            .await
            .unwrap();
        let result = seq.suggest_headline(&run).await.unwrap();

        assert_eq!(result.text, "Light and Colour");
        assert_eq!(run.context.completed_stages(), 3);
        assert_eq!(llm.requests()[3][0].content, HEADLINE_ROLE);
        assert_eq!(llm.requests()[3][1].content, "Impressionist art trends");
    }
}
