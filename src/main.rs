use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "tkoscan")]
#[command(about = "Check subdomains for takeover with tko-subs and record the results")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.tkoscan/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tko-subs against one domain and/or the domains in the database
    Run(cli::run::RunArgs),

    /// Manage the domain database
    Domains {
        #[command(subcommand)]
        command: cli::domains::DomainsCommand,
    },

    /// Write a starter config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run(args) => {
            cli::run::run_command(config_path, args).await?;
        }
        Commands::Domains { command } => {
            cli::domains::domains_command(config_path, command)?;
        }
        Commands::Init { force } => {
            cli::init::init_command(config_path, force)?;
        }
    }

    Ok(())
}
