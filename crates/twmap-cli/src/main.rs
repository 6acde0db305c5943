//! twmap CLI - TradeWars 2002 map building and route planning
//!
//! Replays captured session output into the map database and plans routes
//! over what has been mapped so far.
//!
//! # Usage
//!
//! ```bash
//! # Feed a captured session into the map
//! twmap parse session.log
//!
//! # Shortest route to the nearest fighter
//! twmap path 1234 --fighters
//!
//! # Best ether probe launch from sector 1
//! twmap probe 1 --top 3
//!
//! # Adjacent trading pairs
//! twmap pairs --port-type SBS-BSB
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

/// twmap - Live session mapping for TradeWars 2002
#[derive(Parser, Debug)]
#[command(name = "twmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// SQLite map database (overrides the configured path)
    #[arg(long, short = 'd', global = true, env = "TWMAP_DATABASE")]
    database: Option<PathBuf>,

    /// Path to a configuration file (skips the global and local lookup)
    #[arg(long, short = 'c', global = true, env = "TWMAP_CONFIG")]
    config: Option<PathBuf>,

    /// More output; repeat for more detail
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Send haggle counter-offers automatically, whatever the map has stored
    #[arg(long, global = true, overrides_with = "no_auto_haggle")]
    auto_haggle: bool,

    /// Never send haggle counter-offers automatically
    #[arg(long, global = true, overrides_with = "auto_haggle")]
    no_auto_haggle: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> twmap_config::ConfigOverrides {
        twmap_config::ConfigOverrides {
            database: self.database.clone(),
            auto_haggle: self.auto_haggle(),
            log_level: self.log_level().map(|level| level.to_string()),
        }
    }

    /// Auto-haggle as forced by the flags, if either was given.
    pub fn auto_haggle(&self) -> Option<bool> {
        if self.auto_haggle {
            Some(true)
        } else if self.no_auto_haggle {
            Some(false)
        } else {
            None
        }
    }

    /// Level picked by the flags alone, if any flag was given.
    fn log_level(&self) -> Option<Level> {
        if self.quiet {
            return Some(Level::ERROR);
        }
        match self.verbose {
            0 => None,
            1 => Some(Level::INFO),
            2 => Some(Level::DEBUG),
            _ => Some(Level::TRACE),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay captured session output into the map database
    Parse(commands::parse::ParseArgs),

    /// Shortest routes from a sector to any of a set of destinations
    Path(commands::path::PathArgs),

    /// Plan ether probe routes through unexplored space
    Probe(commands::probe::ProbeArgs),

    /// Find nearby port pairs that trade with each other
    Pairs(commands::pairs::PairsArgs),

    /// Course plot keystrokes that map every warp from sector 1
    Traverse(commands::traverse::TraverseArgs),

    /// View and change persisted game settings
    #[command(subcommand)]
    Settings(commands::settings::SettingsCommand),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(&cli.global)?;

    let log_level = cli
        .global
        .log_level()
        .or_else(|| config.logging.level.parse().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Parse(args) => commands::parse::execute(args, &config, &cli.global),
        Commands::Path(args) => commands::path::execute(args, &config),
        Commands::Probe(args) => commands::probe::execute(args, &config),
        Commands::Pairs(args) => commands::pairs::execute(args, &config),
        Commands::Traverse(args) => commands::traverse::execute(args, &config),
        Commands::Settings(cmd) => commands::settings::execute(cmd, &config),
        Commands::Config(cmd) => commands::config::execute(cmd, &config, &cli.global),
    }
}
