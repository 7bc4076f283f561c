//! End-to-end article production: run the pipeline, title it, write the artifact.

use std::path::PathBuf;

use crate::artifact::ArtifactWriter;
use crate::pipeline::{Pipeline, PipelineError, PipelineRun, StageSequencer};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct ArticleReport {
    pub path: PathBuf,
    pub run: PipelineRun,
    pub title: Option<String>,
    /// Stage tokens plus the headline call, if any.
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// Ties the stage sequencer to the artifact writer.
pub struct ArticleForge {
    sequencer: StageSequencer,
    writer: ArtifactWriter,
    suggest_title: bool,
}

impl ArticleForge {
    pub fn new(sequencer: StageSequencer, writer: ArtifactWriter) -> Self {
        Self {
            sequencer,
            writer,
            suggest_title: true,
        }
    }

    /// Skip the headline call; the artifact uses the default header.
    pub fn without_title(mut self) -> Self {
        self.suggest_title = false;
        self
    }

    /// Produce one article. Any error aborts the whole run; nothing is resumable.
    pub async fn produce(
        &self,
        pipeline: &Pipeline,
        directive: &str,
        keyword: &str,
    ) -> Result<ArticleReport, PipelineError> {
        let run = self.sequencer.run(pipeline, directive, keyword).await?;
        let mut total_tokens = run.context.cumulative_tokens();

        let title = if self.suggest_title {
            let headline = self.sequencer.suggest_headline(&run).await?;
            total_tokens = total_tokens.saturating_add(headline.tokens);
            Some(headline.text)
        } else {
            None
        };

        let path = self
            .writer
            .render_titled(keyword, title.as_deref(), &run.result)?;
        let total_cost = self
            .sequencer
            .executor()
            .accountant()
            .estimate_cost(total_tokens);

        tracing::info!(total_tokens, total_cost, path = %path.display(), "Article complete");
        Ok(ArticleReport {
            path,
            run,
            title,
            total_tokens,
            total_cost,
        })
    }
}
