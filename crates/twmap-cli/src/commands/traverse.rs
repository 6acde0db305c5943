//! Traverse command - Course plots that map every warp from sector 1

use anyhow::{Context, Result};
use clap::Args;
use twmap_config::TwmapConfig;
use twmap_core::{FullMapTraversal, SectorId, Settings};

use super::open_store;

/// Arguments for the traverse command
#[derive(Args, Debug)]
pub struct TraverseArgs {
    /// Highest sector number (defaults to the size recorded from the game)
    #[arg(long, short = 'm')]
    max_sector: Option<SectorId>,

    /// Only print how many plots the traversal needs
    #[arg(long)]
    count: bool,
}

/// Execute the traverse command
pub fn execute(args: TraverseArgs, config: &TwmapConfig) -> Result<()> {
    let max_sector = match args.max_sector {
        Some(max) => max,
        None => {
            let store = open_store(config)?;
            Settings::from_persisted(store.load_settings()?)
                .max_sector()
                .context("Game size unknown: pass --max-sector or view the game settings first")?
        }
    };

    let traversal = FullMapTraversal::new(max_sector);
    if args.count {
        println!("{}", traversal.plots().count());
        return Ok(());
    }
    for (from, to) in traversal.plots() {
        println!("F{}", from);
        println!("{}", to);
    }
    Ok(())
}
