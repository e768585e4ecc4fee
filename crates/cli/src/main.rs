//! fixloop CLI, the main entry point.
//!
//! Commands:
//! - `init`     Write a default `fixloop.toml`
//! - `tools`    List the tools offered to the model
//! - `suggest`  One-shot fix suggestion (no tools)
//! - `run`      Run the tool-calling agent loop, optionally publishing a PR

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fixloop",
    about = "fixloop: let an LLM fix a reported bug and open a pull request",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(
        short,
        long,
        global = true,
        env = "FIXLOOP_CONFIG",
        default_value = fixloop_config::CONFIG_FILE_NAME
    )]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// List the registered tools and their argument schemas
    Tools,

    /// Ask the model once for corrected code and print it
    Suggest {
        /// Write the suggestion over the target file
        #[arg(long)]
        apply: bool,
    },

    /// Run the agent loop against the configured issue
    Run {
        /// Override the step budget
        #[arg(long)]
        max_steps: Option<u32>,

        /// Branch, commit, push and open a pull request afterwards
        #[arg(long)]
        publish: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { force } => commands::init::run(&cli.config, force).await?,
        Commands::Tools => commands::tools::run(&cli.config, cli.verbose).await?,
        Commands::Suggest { apply } => commands::suggest::run(&cli.config, apply).await?,
        Commands::Run { max_steps, publish } => commands::run::run(&cli.config, max_steps, publish).await?,
    }

    Ok(())
}
