//! Static stage descriptions and pipeline wiring checks.

use std::collections::HashSet;

use super::{PipelineContext, PipelineError};

/// Placeholder substituted with the run's keyword inside role instructions.
pub const KEYWORD_PLACEHOLDER: &str = "{keyword}";

/// A value a stage can read when building its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Directive,
    Keyword,
    Research,
    /// Output of an earlier stage.
    Output(String),
}

impl Input {
    pub fn output(key: impl Into<String>) -> Self {
        Self::Output(key.into())
    }

    fn resolve<'a>(&self, ctx: &'a PipelineContext) -> Result<&'a str, PipelineError> {
        match self {
            Self::Directive => Ok(ctx.directive()),
            Self::Keyword => Ok(ctx.keyword()),
            Self::Research => ctx
                .research()
                .ok_or_else(|| PipelineError::Wiring("research report not available".to_string())),
            Self::Output(key) => ctx.output(key).ok_or_else(|| {
                PipelineError::Wiring(format!("stage output '{}' not available", key))
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct PayloadPart {
    label: Option<String>,
    input: Input,
}

/// One step of a pipeline: a role instruction, the inputs it reads, and where its output goes.
#[derive(Debug, Clone)]
pub struct StageSpec {
    output_key: String,
    role_instruction: String,
    parts: Vec<PayloadPart>,
}

impl StageSpec {
    pub fn new(output_key: impl Into<String>, role_instruction: impl Into<String>) -> Self {
        Self {
            output_key: output_key.into(),
            role_instruction: role_instruction.into(),
            parts: Vec::new(),
        }
    }

    /// Add an input passed verbatim.
    pub fn input(mut self, input: Input) -> Self {
        self.parts.push(PayloadPart { label: None, input });
        self
    }

    /// Add an input rendered as a `Label: value` line.
    pub fn labelled(mut self, label: impl Into<String>, input: Input) -> Self {
        self.parts.push(PayloadPart {
            label: Some(label.into()),
            input,
        });
        self
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.parts.iter().map(|p| &p.input)
    }

    /// Role instruction with the run's keyword substituted.
    pub fn role_instruction(&self, ctx: &PipelineContext) -> String {
        self.role_instruction
            .replace(KEYWORD_PLACEHOLDER, ctx.keyword())
    }

    /// Build the user payload from the context.
    ///
    /// Fails only when an input is missing, which means the pipeline was wired wrong.
    pub fn build_payload(&self, ctx: &PipelineContext) -> Result<String, PipelineError> {
        let mut lines = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let value = part.input.resolve(ctx)?;
            lines.push(match &part.label {
                Some(label) => format!("{}: {}", label, value),
                None => value.to_string(),
            });
        }
        Ok(lines.join("\n"))
    }
}

/// A fixed, validated sequence of stages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<StageSpec>,
}

impl Pipeline {
    /// Build a pipeline, rejecting wiring mistakes up front.
    ///
    /// # Errors
    /// - no stages
    /// - two stages writing the same output key
    /// - a stage reading an output that no earlier stage produces
    pub fn new(name: impl Into<String>, stages: Vec<StageSpec>) -> Result<Self, PipelineError> {
        let name = name.into();
        if stages.is_empty() {
            return Err(PipelineError::Wiring(format!(
                "pipeline '{}' has no stages",
                name
            )));
        }

        let mut produced: HashSet<&str> = HashSet::new();
        for stage in &stages {
            for input in stage.inputs() {
                if let Input::Output(key) = input {
                    if !produced.contains(key.as_str()) {
                        return Err(PipelineError::Wiring(format!(
                            "stage '{}' reads '{}' before it is produced",
                            stage.output_key, key
                        )));
                    }
                }
            }
            if !produced.insert(stage.output_key.as_str()) {
                return Err(PipelineError::Wiring(format!(
                    "stage output '{}' is produced twice",
                    stage.output_key
                )));
            }
        }

        Ok(Self { name, stages })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Whether any stage reads the research report.
    pub fn needs_research(&self) -> bool {
        self.stages
            .iter()
            .any(|s| s.inputs().any(|i| *i == Input::Research))
    }

    /// Output key of the last stage; its text is the pipeline's result.
    pub fn result_key(&self) -> &str {
        // `new` guarantees at least one stage.
        self.stages
            .last()
            .map(|s| s.output_key.as_str())
            .unwrap_or_default()
    }
}
