//! Settings command - Persisted game settings
//!
//! The game itself reports most of these (StarDock location, game size);
//! setting them here is for maps started before that screen was seen.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Subcommand;
use twmap_config::TwmapConfig;
use twmap_core::store::{AUTO_HAGGLE_KEY, MAX_SECTOR_KEY, STARDOCK_KEY};
use twmap_core::Settings;

use super::open_store;

/// Settings management commands
#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// List every persisted setting
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one setting
    Get {
        /// Setting key (e.g. "stardock")
        key: String,
    },

    /// Persist a setting
    Set {
        /// Setting key: stardock, max_sector or auto_haggle
        key: String,

        /// New value
        value: String,
    },

    /// Show map statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Execute the settings command
pub fn execute(cmd: SettingsCommand, config: &TwmapConfig) -> Result<()> {
    let store = open_store(config)?;
    match cmd {
        SettingsCommand::List { json } => {
            let settings = Settings::from_persisted(store.load_settings()?);
            if json {
                let map: BTreeMap<&str, &str> = settings.entries().into_iter().collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for (key, value) in settings.entries() {
                    println!("{} = {}", key, value);
                }
            }
        }
        SettingsCommand::Get { key } => match store.setting(&key)? {
            Some(value) => println!("{}", value),
            None => anyhow::bail!("Setting '{}' is not set", key),
        },
        SettingsCommand::Set { key, value } => {
            check_value(&key, &value)?;
            store
                .set_setting(&key, &value)
                .with_context(|| format!("Failed to save setting '{}'", key))?;
            println!("{} = {}", key, value);
        }
        SettingsCommand::Stats { json } => {
            let stats = store.stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Sectors:  {}", stats.sectors);
                println!("Warps:    {}", stats.warps);
                println!("Explored: {}", stats.explored);
                println!("Ports:    {}", stats.ports);
                println!("Planets:  {}", stats.planets);
                println!("Fighters: {}", stats.fighters);
            }
        }
    }
    Ok(())
}

/// Reject values the map tools could not read back.
fn check_value(key: &str, value: &str) -> Result<()> {
    match key {
        STARDOCK_KEY | MAX_SECTOR_KEY => {
            value
                .parse::<u32>()
                .with_context(|| format!("'{}' must be a sector number", key))?;
        }
        AUTO_HAGGLE_KEY => {
            let probe = Settings::from_persisted([(key.to_string(), value.to_string())].into());
            probe
                .auto_haggle()
                .with_context(|| format!("'{}' must be true or false", key))?;
        }
        _ => anyhow::bail!(
            "Unknown setting '{}' (expected {}, {} or {})",
            key,
            STARDOCK_KEY,
            MAX_SECTOR_KEY,
            AUTO_HAGGLE_KEY
        ),
    }
    Ok(())
}
