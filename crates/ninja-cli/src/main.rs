//! Ninja Bucks CLI
//!
//! Command-line interface for Ninja Bucks - track ninjas and their ninja
//! bucks in a hosted JSON bin.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ninja_core::Config;

mod commands;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "ninjabucks")]
#[command(about = "Ninja Bucks - track ninjas and their ninja bucks")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// List all ninjas
    #[command(alias = "ls")]
    List,
    /// Add a new ninja
    Add {
        /// Ninja name (stored uppercase)
        name: String,
        /// Starting ninja bucks
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        bucks: i64,
    },
    /// Give ninja bucks to a ninja
    Give {
        /// Position in the list (see `ninjabucks list`)
        index: usize,
        /// Amount to give (greater than 0)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Spend ninja bucks of a ninja
    Spend {
        /// Position in the list (see `ninjabucks list`)
        index: usize,
        /// Amount to spend (greater than 0)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Show configuration and remote bin status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, bin_id, master_key, request_timeout_secs, log_file)
        key: String,
        /// Configuration value ("none" clears optional keys)
        value: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands must work even when the config is incomplete
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    // Handle TUI (default when no command given)
    if matches!(&cli.command, Some(Commands::Tui) | None) {
        return tui::run(config, &output).await;
    }

    init_cli_logging();

    if let Some(Commands::Status) = &cli.command {
        return commands::status::show(&config, &output).await;
    }

    let mut engine = commands::open_engine(&config)?;

    let result = match cli.command {
        Some(Commands::List) => commands::ninja::list(&mut engine, &output).await,
        Some(Commands::Add { name, bucks }) => {
            commands::ninja::add(&mut engine, name, bucks, &output).await
        }
        Some(Commands::Give { index, amount }) => {
            commands::ninja::give(&mut engine, index, amount, &output).await
        }
        Some(Commands::Spend { index, amount }) => {
            commands::ninja::spend(&mut engine, index, amount, &output).await
        }
        // Handled above
        Some(Commands::Tui | Commands::Status | Commands::Config { .. }) | None => Ok(()),
    };

    engine.shutdown().await;
    result
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging for one-shot commands
///
/// Only initializes if NINJABUCKS_LOG is set. Logs go to stderr so they
/// never mix with command output.
fn init_cli_logging() {
    let Ok(log_level) = std::env::var("NINJABUCKS_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "ninja_core={},ninjabucks={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
