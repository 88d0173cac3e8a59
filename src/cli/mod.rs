//! Command-line surface over the [`Orchestrator`](crate::application::Orchestrator).

pub mod commands;
pub mod output;
pub mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use commands::delegate::DelegateArgs;
use commands::generate::{ActivateArgs, GenerateArgs, RegisterArgs};

#[derive(Parser, Debug)]
#[command(name = "omniroute", version, about = "Route tasks to handlers, generate new ones, and recover from failures")]
pub struct Cli {
    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .omniroute/config.yaml and .omniroute/local.yaml)
    #[arg(long, global = true, value_name = "PATH", env = "OMNIROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route a task to a handler and run it
    Delegate(DelegateArgs),
    /// Generate and persist a handler script
    Generate(GenerateArgs),
    /// Load a previously generated handler script
    Activate(ActivateArgs),
    /// Generate, activate and register a handler
    Register(RegisterArgs),
    /// List registered handlers
    Handlers,
    /// Parse a model reply from stdin into a diagnosis
    Diagnose,
}

/// Load validated configuration from `path`, or from the default locations.
pub fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Run a parsed command against `config`.
pub async fn run(command: Commands, config: Config, json_mode: bool) -> Result<()> {
    match command {
        Commands::Delegate(args) => commands::delegate::execute(args, config, json_mode).await,
        Commands::Generate(args) => commands::generate::generate(args, config, json_mode).await,
        Commands::Activate(args) => commands::generate::activate(args, config, json_mode).await,
        Commands::Register(args) => commands::generate::register(args, config, json_mode).await,
        Commands::Handlers => commands::handlers::execute(config, json_mode).await,
        Commands::Diagnose => commands::diagnose::execute(json_mode),
    }
}

/// Report a fatal error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("Error:").red().bold());
    }
    std::process::exit(1);
}
