mod commands;
mod summary;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use genesys_core::registry::DeviceRegistry;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genesys", about = "Genesys scanner session and image pipeline tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model registry (TOML) to use instead of the built-in one
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the models in the registry
    Models(commands::models::ModelsArgs),
    /// Compute and print the scan session for a request
    Session(commands::session::SessionArgs),
    /// Program a scan against the in-memory scanner and dump the registers
    Regs(commands::regs::RegsArgs),
    /// Replay a raw capture through the image pipeline
    Run(commands::run::RunArgs),
    /// Print or save the model registry as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let registry = match cli.registry {
        Some(ref path) => DeviceRegistry::from_path(path)
            .with_context(|| format!("Failed to load registry {}", path.display()))?,
        None => DeviceRegistry::builtin(),
    };

    match &cli.command {
        Commands::Models(args) => commands::models::run(args, &registry),
        Commands::Session(args) => commands::session::run(args, &registry),
        Commands::Regs(args) => commands::regs::run(args, &registry),
        Commands::Run(args) => commands::run::run(args, &registry),
        Commands::Config(args) => commands::config::run(args, &registry),
    }
}
