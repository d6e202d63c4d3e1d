//! cardseal command-line interface.

pub mod commands;
pub mod render;

use std::path::PathBuf;

use cardseal_secrets::SealError;
use clap::{Parser, Subcommand};

/// cardseal - seal a card for a display widget and read it back
#[derive(Parser)]
#[command(name = "cardseal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "CARDSEAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt card details into the shared container
    Seal(commands::seal::SealArgs),

    /// Decrypt and display the saved card once
    Show(commands::show::ShowArgs),

    /// Re-read the saved card on a fixed interval
    Watch(commands::watch::WatchArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Seal(args) => commands::seal::run(args, config_path).await,
        Commands::Show(args) => commands::show::run(args, config_path).await,
        Commands::Watch(args) => commands::watch::run(args, config_path).await,
        Commands::Config(args) => commands::config::run(args, config_path).await,
        Commands::Version => {
            println!("cardseal {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Whether `err` carries an unrecoverable [`SealError`] anywhere in its chain.
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<SealError>())
        .any(SealError::is_fatal)
}
