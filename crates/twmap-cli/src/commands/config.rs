//! Config command - View and manage configuration
//!
//! - Show the effective configuration
//! - Write a default configuration file (local or global)
//! - Show configuration file paths

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use twmap_config::{ConfigLoader, TwmapConfig};

use super::resolve_root;
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file if none exists
    Init {
        /// Write ~/.twmap/config.toml instead of the local file
        #[arg(long)]
        global: bool,
    },

    /// Show configuration file paths
    Path {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Config file named on the command line
    pub explicit: Option<PathBuf>,
    pub global_exists: bool,
    pub local_exists: bool,
}

/// Execute the config command
pub fn execute(cmd: ConfigCommand, config: &TwmapConfig, global: &GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print!(
                    "{}",
                    toml::to_string_pretty(config).context("Failed to render configuration")?
                );
            }
        }
        ConfigCommand::Init { global: to_global } => {
            let loader = ConfigLoader::new();
            let path = if to_global {
                loader.init_global()?
            } else {
                loader.init_local(&resolve_root()?)?
            };
            println!("{}", path.display());
        }
        ConfigCommand::Path { json } => {
            let loader = ConfigLoader::new();
            let global_path = loader.global_config_path();
            let local = loader.local_config_path(&resolve_root()?);
            let paths = ConfigPaths {
                global_exists: global_path.as_ref().is_some_and(|p| p.exists()),
                local_exists: local.exists(),
                global: global_path,
                local,
                explicit: global.config.clone(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&paths)?);
            } else {
                print_paths(&paths);
            }
        }
    }
    Ok(())
}

fn print_paths(paths: &ConfigPaths) {
    let mark = |exists: bool| if exists { "" } else { " (not found)" };
    match &paths.global {
        Some(path) => println!("global: {}{}", path.display(), mark(paths.global_exists)),
        None => println!("global: (no home directory)"),
    }
    println!("local:  {}{}", paths.local.display(), mark(paths.local_exists));
    if let Some(path) = &paths.explicit {
        println!("in use: {}", path.display());
    }
}
