use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use article_forge::artifact::{ArtifactWriter, PdfRenderer};
use article_forge::budget::{CostAccountant, StdinConfirm};
use article_forge::llm::{LlmClient, OpenAiClient};
use article_forge::pipeline::{CallExecutor, PipelineKind, StageSequencer};
use article_forge::research::{research_banner, LlmResearcher};
use article_forge::{ArticleForge, Config};

#[derive(Debug, Parser)]
#[command(name = "article-forge", version, about = "Write, review and render an article through a chain of personas")]
struct Cli {
    /// Pipeline to run: `editorial` or `persona`
    #[arg(long, default_value = "persona")]
    pipeline: PipelineKind,

    /// Title/prompt of the post (asked interactively when omitted)
    #[arg(long)]
    directive: Option<String>,

    /// Target keyword (asked interactively when omitted)
    #[arg(long)]
    keyword: Option<String>,

    /// Budget ceiling before confirmation is required
    #[arg(long)]
    max_cost: Option<f64>,

    /// Directory the PDF is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Model used for every stage
    #[arg(long)]
    model: Option<String>,

    /// Skip the headline suggestion
    #[arg(long)]
    no_title: bool,

    /// Debug logging (includes every generated response)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => {}
        Err(Failure::Pipeline(err)) => {
            eprintln!("{}", err);
            std::process::exit(err.exit_code());
        }
        Err(Failure::Setup(err)) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}

enum Failure {
    Setup(anyhow::Error),
    Pipeline(article_forge::pipeline::PipelineError),
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::Setup(err)
    }
}

async fn run(cli: Cli) -> Result<(), Failure> {
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(max_cost) = cli.max_cost {
        config.budget = config
            .budget
            .with_max_cost(max_cost)
            .context("Invalid --max-cost")?;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }

    let directive = match cli.directive {
        Some(d) => d,
        None => prompt_line("Enter your prompt (title of the post): ")?,
    };
    let keyword = match cli.keyword {
        Some(k) => k,
        None => prompt_line("Enter your target keyword: ")?,
    };

    let pipeline = cli
        .pipeline
        .build()
        .map_err(Failure::Pipeline)?;
    tracing::info!(
        pipeline = %cli.pipeline,
        model = %config.model,
        max_cost = config.budget.max_cost,
        "Configuration loaded"
    );

    let llm: Arc<dyn LlmClient> = Arc::new(
        OpenAiClient::new(config.credentials.clone()).context("Failed to build HTTP client")?,
    );
    let accountant = CostAccountant::new(config.budget, Arc::new(StdinConfirm::new()));
    let executor = CallExecutor::new(Arc::clone(&llm), config.model.clone(), accountant, config.retry);
    let sequencer = StageSequencer::new(executor)
        .with_researcher(Arc::new(LlmResearcher::new(llm, config.model.clone())))
        .on_research(Arc::new(|report: &str| print!("{}", research_banner(report))));
    let writer = ArtifactWriter::new(config.output_dir.clone(), Box::new(PdfRenderer::new()));

    let mut forge = ArticleForge::new(sequencer, writer);
    if cli.no_title {
        forge = forge.without_title();
    }

    let report = forge
        .produce(&pipeline, &directive, &keyword)
        .await
        .map_err(Failure::Pipeline)?;

    if let Some(title) = &report.title {
        println!("Suggested title: {}", title.trim());
    }
    println!("Final draft saved as '{}'", report.path.display());
    println!(
        "Total cost for {} tokens: ${:.2}",
        report.total_tokens, report.total_cost
    );
    Ok(())
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", prompt)?;
    stdout.flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if read == 0 || value.is_empty() {
        anyhow::bail!("no input given for: {}", prompt.trim_end_matches([':', ' ']));
    }
    Ok(value)
}
