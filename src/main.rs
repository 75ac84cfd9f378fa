//! # Research Agent
//!
//! Command-line front end for the `research-pipeline` crate.
//!
//! Two modes:
//! - `research`: Plan → Search → Extract → Synthesize, printing a cited report
//! - `rag`: Retrieve → Generate → Critique loop, refined until the critic is
//!   confident enough or the iteration cap is hit
//!
//! ## Quick Start
//! ```bash
//! cargo run -- "What are the latest developments in AI agents?"
//! cargo run -- --mode rag --max-iterations 2 "How does Tokio schedule tasks?"
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

/// Configuration management
mod config;

/// Provider wiring and output rendering
mod agent;

// =============================================================================
// IMPORTS
// =============================================================================
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::agent::{load_corpus, render_rag, render_report, ResearchAgent};
use crate::config::Config;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
/// Which executor to run
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Linear research pipeline with cited report
    Research,
    /// Critique-refine loop over retrieved context
    Rag,
}

#[derive(Parser, Debug)]
#[command(
    name = "research-agent",
    version,
    about = "Research pipeline and agentic RAG over a local LLM",
    long_about = r#"
Research Agent - plan, search, extract and synthesize with a local model.

PREREQUISITES:
  1. Install Ollama: https://ollama.ai
  2. Pull a model: ollama pull llama3.2
  3. Start Ollama: ollama serve

RETRIEVAL:
  Without --corpus every search returns one synthetic placeholder hit.
  With --corpus, searches rank the given JSON array of
  {"title", "url", "snippet"} objects by term overlap.

EXAMPLES:
  research-agent "What are the latest developments in AI agents?"
  research-agent --mode rag --corpus docs.json "How does Tokio schedule tasks?"
  research-agent --json --model qwen2.5 "Rust web frameworks"
"#
)]
struct Args {
    /// The research topic or question to investigate
    #[arg(value_name = "QUERY")]
    query: String,

    /// Executor to run
    #[arg(long, value_enum, default_value_t = Mode::Research)]
    mode: Mode,

    /// Iteration cap for rag mode (overrides MAX_ITERATIONS)
    #[arg(long, env = "MAX_ITERATIONS")]
    max_iterations: Option<usize>,

    /// The Ollama model to use (overrides OLLAMA_MODEL)
    #[arg(short = 'm', long = "model", env = "OLLAMA_MODEL")]
    model: Option<String>,

    /// JSON corpus for the static retriever
    #[arg(long, value_name = "FILE")]
    corpus: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    init_logging(args.verbose, &config.log_level)?;

    if let Some(model) = args.model.clone() {
        config.model = model;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    config.validate()?;

    info!(
        model = %config.model,
        host = %config.ollama_host,
        mode = ?args.mode,
        "Configuration loaded"
    );

    let agent = match &args.corpus {
        Some(path) => ResearchAgent::with_corpus(config, load_corpus(path)?),
        None => ResearchAgent::new(config),
    };
    info!(retriever = agent.retriever_name(), "Retriever ready");

    let result = run(&agent, &args).await;

    match result {
        Ok(output) => {
            println!("{}", output);
            info!("Run completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            eprintln!("\nRun failed: {:#}", e);

            let message = format!("{:#}", e);
            if message.contains("connection refused") || message.contains("Connection refused") {
                eprintln!("\nTip: make sure Ollama is running:\n   ollama serve");
            } else if message.contains("model") {
                eprintln!("\nTip: make sure the model is installed:\n   ollama pull llama3.2");
            }
            Err(e)
        }
    }
}

async fn run(agent: &ResearchAgent, args: &Args) -> Result<String> {
    match args.mode {
        Mode::Research => {
            let report = agent.research(&args.query).await?;
            if args.json {
                serde_json::to_string_pretty(&report).context("Failed to serialize report")
            } else {
                Ok(render_report(&report))
            }
        }
        Mode::Rag => {
            let outcome = agent.agentic_rag(&args.query).await?;
            if args.json {
                serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")
            } else {
                Ok(render_rag(&outcome))
            }
        }
    }
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug and the
/// configured level applies.
fn init_logging(verbose: bool, default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["test", "What is Rust?"]);

        assert_eq!(args.query, "What is Rust?");
        assert_eq!(args.mode, Mode::Research);
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(args.corpus.is_none());
    }

    #[test]
    fn test_args_rag_mode_with_flags() {
        let args = Args::parse_from([
            "test",
            "--mode",
            "rag",
            "--max-iterations",
            "2",
            "--json",
            "--verbose",
            "--corpus",
            "docs.json",
            "Test query",
        ]);

        assert_eq!(args.mode, Mode::Rag);
        assert_eq!(args.max_iterations, Some(2));
        assert!(args.json);
        assert!(args.verbose);
        assert_eq!(args.corpus, Some(PathBuf::from("docs.json")));
        assert_eq!(args.query, "Test query");
    }

    #[test]
    fn test_args_reject_unknown_mode() {
        assert!(Args::try_parse_from(["test", "--mode", "chat", "q"]).is_err());
    }
}
