//! CLI command implementations

pub mod config;
pub mod pairs;
pub mod parse;
pub mod path;
pub mod probe;
pub mod settings;
pub mod traverse;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use twmap_config::{ConfigLoader, TwmapConfig};
use twmap_core::{GraphStore, SectorId};

use crate::GlobalOptions;

/// Directory searched for the local `.twmap/config.toml`.
pub fn resolve_root() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

/// Load configuration with optional config file override.
pub fn load_config(global: &GlobalOptions) -> Result<TwmapConfig> {
    let overrides = global.to_config_overrides();
    let mut loader = ConfigLoader::new();

    if let Some(ref config_path) = global.config {
        return loader
            .load_file(config_path, Some(&overrides))
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }

    let root = resolve_root()?;
    loader
        .load(&root, Some(&overrides))
        .context("Failed to load configuration")
}

/// Open the configured map database, creating it if needed.
pub fn open_store(config: &TwmapConfig) -> Result<GraphStore> {
    let path = &config.storage.database;
    GraphStore::open(path)
        .with_context(|| format!("Failed to open map database {}", path.display()))
}

pub fn avoid_set(avoid: &[SectorId]) -> HashSet<SectorId> {
    avoid.iter().copied().collect()
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
