//! Tactico CLI: the main entry point.
//!
//! Commands:
//! - `ask`     Analyze a single question
//! - `chat`    Ask questions interactively
//! - `tools`   List the match-analysis tools
//! - `doctor`  Check the language model and graph connections
//! - `config`  Show or initialize the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tactico",
    about = "Tactico: tactical football analysis over a match graph",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (defaults to ~/.tactico/config.toml)
    #[arg(short, long, global = true, env = "TACTICO_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question about the match
    Ask {
        /// The question, e.g. "How did Barcelona build up to the first goal?"
        question: String,

        /// Print the full analysis (answer, trace, run state) as JSON
        #[arg(long)]
        json: bool,

        /// Override the maximum number of reasoning iterations
        #[arg(long)]
        max_iterations: Option<u32>,
    },

    /// Ask questions interactively
    Chat,

    /// List the available match-analysis tools
    Tools,

    /// Check configuration, language model and graph connectivity
    Doctor,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask {
            question,
            json,
            max_iterations,
        } => commands::ask::run(config_path, &question, json, max_iterations).await?,
        Commands::Chat => commands::chat::run(config_path).await?,
        Commands::Tools => commands::tools::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
        },
    }

    Ok(())
}
