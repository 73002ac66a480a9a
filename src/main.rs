//! # gait CLI
//!
//! The `gait` binary runs the gait-analysis RAG workshop: an interactive
//! question loop by default, plus one-shot commands for scripting.
//!
//! ## Usage
//!
//! ```bash
//! gait [--config ./gait.toml] [--stride] [--efficiency] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gait` / `gait chat` | Interactive question loop |
//! | `gait ask "<question>"` | Retrieve context and answer once |
//! | `gait context "<question>"` | Print the retrieved context only |
//! | `gait runners` | List runners and animals |
//! | `gait stats` | Average metrics for humans vs animals |
//! | `gait init` | Write the built-in data to the data directory |

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use gait_rag::answer::AnswerSettings;
use gait_rag::completion;
use gait_rag::config::{self, Config};
use gait_rag::enrich::{EfficiencyScoreEnricher, StrideLengthEnricher};
use gait_rag::error::ConfigError;
use gait_rag::pipeline::Pipeline;
use gait_rag::repl::{self, ReplOptions};
use gait_rag::stats;
use gait_rag::store;

/// Gait analysis RAG: ask questions about how famous runners and animals
/// move, answered from a small built-in dataset.
#[derive(Parser)]
#[command(
    name = "gait",
    about = "Gait analysis RAG: keyword retrieval over runner and animal gait metrics, answered by an LLM",
    version
)]
struct Cli {
    /// Path to a configuration file (TOML). Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding `runners_data.json` and `definitions.json`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the chat model identifier.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Enable the stride length metric.
    #[arg(long, global = true)]
    stride: bool,

    /// Enable the efficiency score metric.
    #[arg(long, global = true)]
    efficiency: bool,

    /// Verbose logging (debug level) on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive question loop (default).
    Chat,

    /// Answer one question and exit.
    Ask {
        /// The question.
        question: String,
    },

    /// Print the context retrieved for a question, without calling the LLM.
    Context {
        /// The question.
        question: String,
    },

    /// List all runners and animals.
    Runners,

    /// Show average metrics for humans vs animals.
    Stats,

    /// Write the built-in dataset to the data directory.
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        cfg.data.dir = dir;
    }
    if let Some(model) = cli.model {
        cfg.llm.model = model;
    }
    cfg.extensions.stride_length |= cli.stride;
    cfg.extensions.efficiency_score |= cli.efficiency;
    config::validate(&cfg)?;

    let command = cli.command.unwrap_or(Commands::Chat);
    let needs_llm = matches!(command, Commands::Chat | Commands::Ask { .. });

    let api_key = if needs_llm && cfg.llm.is_enabled() {
        resolve_api_key(&cfg)?
    } else {
        None
    };

    let provider = completion::create_provider(&cfg.llm, api_key)?;
    let mut pipeline = Pipeline::new(provider, AnswerSettings::from_config(&cfg.llm));

    if cfg.data.load_on_start {
        // On failure the pipeline logs and keeps the built-in data
        let _ = pipeline.load(&cfg.data.dir);
    }
    if cfg.extensions.stride_length {
        pipeline.enable(Box::new(StrideLengthEnricher::new()))?;
    }
    if cfg.extensions.efficiency_score {
        pipeline.enable(Box::new(EfficiencyScoreEnricher))?;
    }

    let options = ReplOptions {
        data_dir: cfg.data.dir.clone(),
        show_context: cfg.display.show_context,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Chat => {
            if cfg.data.seed_on_start && !store::documents_exist(&cfg.data.dir) {
                pipeline.save(&cfg.data.dir)?;
            }
            let stdin = io::stdin();
            let mut input = stdin.lock();
            repl::run(&mut pipeline, &options, &mut input, &mut out)?;
        }
        Commands::Ask { question } => {
            repl::ask(&pipeline, &options, &question, &mut out)?;
        }
        Commands::Context { question } => {
            write!(out, "{}", pipeline.retrieve(&question))?;
        }
        Commands::Runners => {
            write!(out, "{}", repl::format_runners(pipeline.entities()))?;
        }
        Commands::Stats => {
            write!(out, "{}", stats::format_stats(pipeline.entities()))?;
        }
        Commands::Init => {
            pipeline.save(&cfg.data.dir)?;
            writeln!(
                out,
                "Data written to {} ({} entities, {} definitions).",
                cfg.data.dir.display(),
                pipeline.entities().len(),
                pipeline.definitions().len()
            )?;
        }
    }

    Ok(())
}

/// Find the API key in the environment, or ask for it on a terminal.
///
/// Returns `Ok(None)` when the answering facade should run disabled, and an
/// error only when `llm.require_api_key` is set and no key was supplied.
fn resolve_api_key(cfg: &Config) -> Result<Option<String>> {
    if let Some(key) = config::api_key_from_env(&cfg.llm) {
        info!(env = %cfg.llm.api_key_env, "API key found");
        return Ok(Some(key));
    }

    if cfg.llm.prompt_for_key && atty::is(atty::Stream::Stdin) {
        eprintln!("\nAPI key not found ({}).", cfg.llm.api_key_env);
        eprintln!("You can either:");
        eprintln!("  1. Create a .env file with: {}=your-key", cfg.llm.api_key_env);
        eprintln!("  2. Enter it now (this session only)");
        eprint!("\nEnter API key (or press Enter to skip): ");
        io::stderr().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let key = line.trim();
        if !key.is_empty() {
            return Ok(Some(key.to_string()));
        }
    }

    if cfg.llm.require_api_key {
        return Err(ConfigError::MissingApiKey(cfg.llm.api_key_env.clone()).into());
    }

    warn!(
        "{} not found. Questions will return an error until a key is configured.",
        cfg.llm.api_key_env
    );
    Ok(None)
}
