use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ragq_core::bootstrap::{
    BuildOptions, ConfiguredPipeline, build_corpus, create_embedder, health_check, load_config,
    open_pipeline, resolve_config_path,
};
use ragq_core::config::Config;
use ragq_core::{CoreError, QueryRequest, QueryResult, answer};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "ragq", version, about = "Answer questions from a pre-indexed corpus")]
struct Cli {
    /// Config file (default: `RAGQ_CONFIG` or config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the corpus, chunk, embed, index, and save the artifacts
    Build {
        /// Corpus source overriding `[corpus] source`
        #[arg(long)]
        source: Option<PathBuf>,
        /// Maximum number of source records to read
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Answer a single question
    Query {
        question: String,
        #[arg(long, allow_negative_numbers = true)]
        top_k: Option<i64>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Answer questions read line by line from stdin
    Ask {
        #[arg(long, allow_negative_numbers = true)]
        top_k: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    init_subscriber(&config_path);
    // Loaded again once the subscriber exists so override warnings are visible.
    let config = load_config(&config_path)
        .with_context(|| format!("invalid configuration in {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    match cli.command {
        Command::Build { source, limit } => run_build(&config, BuildOptions { source, limit }).await,
        Command::Query {
            question,
            top_k,
            json,
        } => run_query(&config, question, top_k, json).await,
        Command::Ask { top_k } => run_ask(&config, top_k).await,
    }
}

fn init_subscriber(config_path: &Path) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level(config_path)))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // stdout carries answers and JSON only
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Log level from the config file, read before any subscriber is installed.
fn log_level(config_path: &Path) -> String {
    Config::load(config_path).map_or_else(
        |_| "info".to_owned(),
        |config| config.observability.log_level,
    )
}

async fn run_build(config: &Config, options: BuildOptions) -> anyhow::Result<()> {
    let embedder = create_embedder(config)?;
    let corpus = build_corpus(config, &embedder, &options).await?;
    let paths = config.artifact_paths();
    corpus
        .save(&paths)
        .context("failed to save corpus artifacts")?;

    println!(
        "indexed {} chunks ({}-dim) -> {}, {}",
        corpus.len(),
        corpus.index().dim(),
        paths.chunks_path.display(),
        paths.index_path.display()
    );
    Ok(())
}

fn request_for(config: &Config, question: String, top_k: Option<i64>) -> QueryRequest {
    let default_top_k = i64::try_from(config.retrieval.top_k).unwrap_or(i64::MAX);
    QueryRequest::new(question).with_top_k(top_k.unwrap_or(default_top_k))
}

async fn ready_pipeline(config: &Config) -> anyhow::Result<ConfiguredPipeline> {
    let pipeline = open_pipeline(config)?;
    health_check(pipeline.generator().backend()).await;
    Ok(pipeline)
}

async fn run_query(
    config: &Config,
    question: String,
    top_k: Option<i64>,
    json: bool,
) -> anyhow::Result<()> {
    let request = request_for(config, question, top_k);
    // Reject bad input before loading models or artifacts.
    request.validate()?;

    let pipeline = ready_pipeline(config).await?;
    let result = answer(&pipeline, &request).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_result(&result));
    }
    Ok(())
}

async fn run_ask(config: &Config, top_k: Option<i64>) -> anyhow::Result<()> {
    if let Some(k) = top_k
        && k <= 0
    {
        bail!("--top-k must be positive, got {k}");
    }
    let pipeline = ready_pipeline(config).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let request = request_for(config, line, top_k);
        match answer(&pipeline, &request).await {
            Ok(result) => print!("{}", render_result(&result)),
            Err(CoreError::InvalidRequest(msg)) => eprintln!("{msg}"),
            Err(e) => tracing::error!("query failed: {e:#}"),
        }
    }

    let stats = pipeline.stats();
    eprintln!(
        "{} queries, average latency {:.0} ms",
        stats.queries, stats.avg_latency_ms
    );
    Ok(())
}

fn render_result(result: &QueryResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.answer);
    if !result.contexts.is_empty() {
        let _ = writeln!(out, "\nContexts:");
        for (i, (context, score)) in result.contexts.iter().zip(&result.scores).enumerate() {
            let _ = writeln!(out, "  [{}] ({score:.3}) {context}", i + 1);
        }
    }
    let _ = writeln!(out, "({} ms)", result.latency_ms);
    out
}
