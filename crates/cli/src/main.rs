mod config;
mod demo;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use runtime::{
    AnthropicBackend, ChatMessage, ConversationRequest, StructuredLoop, TextOrchestrator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "fcall.toml";
const DEFAULT_LOG_FILTER: &str = "info";
const ASK_PROMPT: &str = "Find the sum of 6 and 12 and say whether it is even or odd";
const CONVERSE_PROMPT: &str =
    "After a math operation with 3 and 2, say whether the result is even or odd";

#[derive(Parser)]
#[command(name = "fcall")]
#[command(about = "Let a model call host functions, safely", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log filter, e.g. "debug" or "runtime=debug" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask through the text protocol with the add_wrong_math tool
    Ask {
        /// The question to ask
        prompt: Option<String>,
    },
    /// Ask through provider-native tool use with the calc tool
    Converse {
        /// The question to ask
        prompt: Option<String>,
    },
    /// Print the tool documentation shown to the model
    Docs,
    /// Run a call expression against the demo tools, without a model
    Call {
        /// Call expression, e.g. "add_wrong_math(2, 3)"
        expr: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Ask { prompt } => {
            let config = Config::load_or_default(&cli.config)?;
            cmd_ask(&config, prompt.as_deref().unwrap_or(ASK_PROMPT)).await
        }
        Commands::Converse { prompt } => {
            let config = Config::load_or_default(&cli.config)?;
            cmd_converse(&config, prompt.as_deref().unwrap_or(CONVERSE_PROMPT)).await
        }
        Commands::Docs => cmd_docs(),
        Commands::Call { expr } => cmd_call(&expr),
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| Error::LogLevel(e.to_string()))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn backend(config: &Config) -> Result<AnthropicBackend> {
    Ok(AnthropicBackend::builder(config.auth()?)
        .base_url(&config.backend.base_url)
        .anthropic_version(&config.backend.anthropic_version)
        .max_tokens(config.backend.max_tokens)
        .build())
}

async fn cmd_ask(config: &Config, prompt: &str) -> Result<()> {
    let orchestrator = TextOrchestrator::new(backend(config)?, demo::registry()?)
        .on_invalid_call(config.orchestrator.on_invalid_call);
    info!(backend = %orchestrator.client(), model = %config.backend.model, "Asking");

    let request = ConversationRequest::new(
        config.backend.max_tokens,
        &config.backend.anthropic_version,
        vec![ChatMessage::user(prompt)],
    );
    let result = orchestrator.run(&config.backend.model, &request).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_converse(config: &Config, prompt: &str) -> Result<()> {
    let model = &config.backend.model;
    let structured = StructuredLoop::new(backend(config)?, demo::dispatch_table()?);
    println!("Question: {prompt}");

    let outcome = structured.ask(model, prompt).await?;
    for block in &outcome.response.output.content {
        println!("{}", serde_json::to_string_pretty(block)?);
    }

    info!(model = %model, tools_used = outcome.tool_uses.len(), "Finished generating text");
    Ok(())
}

fn cmd_docs() -> Result<()> {
    println!("{}", demo::registry()?.render_docs());
    Ok(())
}

fn cmd_call(expr: &str) -> Result<()> {
    let value = runtime::invoke(&demo::registry()?, expr)?;
    println!("{}", serde_json::to_string(&value)?);
    Ok(())
}
