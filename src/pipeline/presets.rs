//! The two built-in article pipelines.

use std::fmt;
use std::str::FromStr;

use super::{Input, Pipeline, PipelineError, StageSpec};

const ART_WRITER: &str = "You are a professional content writer with 10+ years of experience in the art market.";
const ARTICLE_LENGTH: &str = "Ensure the article is between 5000 and 8000 words long.";
const FEEDBACK_LIST: &str = "Give a bulleted list of feedback and advice for the content writer.";

fn editor_role() -> String {
    format!(
        "You are an editor with 10+ years of experience. Review the following article. Check the content for clarity, coherence, consistency, grammar, and punctuation. {}",
        FEEDBACK_LIST
    )
}

fn senior_editor_role(subject: &str, checks: &str) -> String {
    format!(
        "You are a senior editor with 15+ years of experience. Review {}. Check the content for {}. {}",
        subject, checks, FEEDBACK_LIST
    )
}

fn seo_role() -> String {
    format!(
        "You are an SEO professional. Review the following article based on the keyword '{{keyword}}'. {}",
        FEEDBACK_LIST
    )
}

/// Which built-in pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Writer, editor, SEO and senior editor passes.
    Editorial,
    /// Research, then writer, designer, reviewers and a simulated audience.
    Persona,
}

impl PipelineKind {
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        match self {
            Self::Editorial => editorial(),
            Self::Persona => persona(),
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editorial => write!(f, "editorial"),
            Self::Persona => write!(f, "persona"),
        }
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "editorial" => Ok(Self::Editorial),
            "persona" => Ok(Self::Persona),
            other => Err(format!("unknown pipeline '{}'", other)),
        }
    }
}

/// Six stages: draft, editor and SEO feedback, rewrite, senior editor feedback, final rewrite.
pub fn editorial() -> Result<Pipeline, PipelineError> {
    Pipeline::new(
        "editorial",
        vec![
            StageSpec::new(
                "draft",
                format!(
                    "{} Consider the following prompt and keyword and write a blogpost about it. {}",
                    ART_WRITER, ARTICLE_LENGTH
                ),
            )
            .labelled("Prompt", Input::Directive)
            .labelled("Keyword", Input::Keyword),
            StageSpec::new("editor_feedback", editor_role()).input(Input::output("draft")),
            StageSpec::new("seo_feedback", seo_role()).input(Input::output("draft")),
            StageSpec::new(
                "rewrite",
                format!(
                    "{} Take the feedback and rewrite the article. {} Ensure the content is engaging and accurate.",
                    ART_WRITER, ARTICLE_LENGTH
                ),
            )
            .labelled("Original Draft", Input::output("draft"))
            .labelled("Editor Feedback", Input::output("editor_feedback"))
            .labelled("SEO Feedback", Input::output("seo_feedback")),
            StageSpec::new(
                "senior_editor_feedback",
                senior_editor_role(
                    "the following article",
                    "clarity, coherence, consistency, interestingness, grammar, and punctuation",
                ),
            )
            .input(Input::output("rewrite")),
            StageSpec::new(
                "final_draft",
                format!(
                    "{} Take the senior editor's feedback and rewrite the article. {} Ensure the content is engaging and accurate.",
                    ART_WRITER, ARTICLE_LENGTH
                ),
            )
            .labelled("Original Draft", Input::output("rewrite"))
            .labelled("Senior Editor Feedback", Input::output("senior_editor_feedback")),
        ],
    )
}

/// Ten stages over a research report, including a simulated audience review.
pub fn persona() -> Result<Pipeline, PipelineError> {
    let checks = "clarity, coherence, consistency, grammar, and punctuation";
    Pipeline::new(
        "persona",
        vec![
            StageSpec::new(
                "draft",
                "You are a professional content writer. Using the research information provided, write a blog post ensuring it's between 5000 and 8000 words long.",
            )
            .labelled("Research Info", Input::Research)
            .labelled("Prompt", Input::Directive)
            .labelled("Keyword", Input::Keyword),
            StageSpec::new(
                "illustrated_draft",
                "You are a graphic designer. Suggest where and what images to add in the blog post by placing descriptions in square brackets at the appropriate places.",
            )
            .input(Input::output("draft")),
            StageSpec::new("seo_feedback", seo_role()).input(Input::output("illustrated_draft")),
            StageSpec::new("editor_feedback", editor_role())
                .input(Input::output("illustrated_draft")),
            StageSpec::new(
                "senior_editor_feedback",
                senior_editor_role("the following article", checks),
            )
            .input(Input::output("illustrated_draft")),
            StageSpec::new(
                "revised_draft",
                "You are a professional content writer. Integrate the feedback from the editor, senior editor, SEO specialist, and graphic designer to produce a refined draft.",
            )
            .labelled("Original Draft", Input::output("illustrated_draft"))
            .labelled("Editor Feedback", Input::output("editor_feedback"))
            .labelled("Senior Editor Feedback", Input::output("senior_editor_feedback"))
            .labelled("SEO Feedback", Input::output("seo_feedback")),
            StageSpec::new(
                "audience_feedback",
                "You represent the target audience for this blog post. Provide feedback on its relevance, interest, and any areas of improvement.",
            )
            .input(Input::output("revised_draft")),
            StageSpec::new(
                "audience_revision",
                "You are a professional content writer. Integrate the feedback from the audience to further refine the draft.",
            )
            .labelled("Original Draft", Input::output("revised_draft"))
            .labelled("Audience Feedback", Input::output("audience_feedback")),
            StageSpec::new(
                "second_senior_editor_feedback",
                senior_editor_role("the audience-revised draft", checks),
            )
            .input(Input::output("audience_revision")),
            StageSpec::new(
                "final_draft",
                "You are a professional content writer. Integrate the feedback from the second senior editor review to finalize the draft.",
            )
            .labelled("Original Draft", Input::output("audience_revision"))
            .labelled(
                "Second Senior Editor Feedback",
                Input::output("second_senior_editor_feedback"),
            ),
        ],
    )
}
