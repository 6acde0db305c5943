//! Path command - Shortest routes to a set of destinations

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;
use twmap_config::TwmapConfig;
use twmap_core::pathfind::{shortest_paths, BfsOptions};
use twmap_core::{ClassPattern, SectorId, WarpGraph};

use super::{avoid_set, open_store};

/// Arguments for the path command
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Starting sector
    start: SectorId,

    /// Destination sectors
    destinations: Vec<SectorId>,

    /// Show a route to every reachable destination, not only the nearest
    #[arg(long = "all-destinations", short = 'a')]
    all: bool,

    /// Walk warps backwards: find the nearest destination that leads to the start
    #[arg(long, short = 'r')]
    reverse: bool,

    /// Add ports of this class pattern, in Ore Org Equ order (e.g. "?S?")
    #[arg(long, short = 'p')]
    port_type: Option<ClassPattern>,

    /// Add every sector holding one of your fighters
    #[arg(long, short = 'f')]
    fighters: bool,

    /// Add federation space and the StarDock
    #[arg(long = "fedspace", short = 'F')]
    fedspace: bool,

    /// Add explored sectors with no known port
    #[arg(long, short = 'b')]
    blind_warps: bool,

    /// Add presumed dead ends
    #[arg(long, short = 'e')]
    dead_ends: bool,

    /// Sectors the route must not pass through
    #[arg(long, short = 'x', num_args = 1..)]
    avoid: Vec<SectorId>,
}

/// Execute the path command
pub fn execute(args: PathArgs, config: &TwmapConfig) -> Result<()> {
    let store = open_store(config)?;
    let avoid = avoid_set(&args.avoid);

    let mut destinations = args.destinations.clone();
    if args.fighters {
        destinations.extend(store.fighter_sectors()?);
    }
    if args.blind_warps {
        destinations.extend(store.blind_warps()?);
    }
    if args.fedspace {
        destinations.extend(&config.routing.fedspace);
        destinations.extend(store.stardock()?);
    }
    if let Some(pattern) = args.port_type {
        let ports = store
            .ports_matching(&pattern)
            .context("Failed to search ports")?;
        destinations.extend(ports.into_iter().filter(|s| !avoid.contains(s)));
    }
    if args.dead_ends {
        let dead_ends = store.dead_ends().context("Failed to find dead ends")?;
        destinations.extend(dead_ends.into_iter().filter(|s| !avoid.contains(s)));
    }
    debug!(count = destinations.len(), "Destinations collected");

    let graph = WarpGraph::load(&store).context("Failed to load warp graph")?;
    let options = BfsOptions {
        reverse: args.reverse,
        all_targets: args.all,
    };
    let routes = shortest_paths(&graph, args.start, &destinations, &avoid, options);

    for route in &routes {
        println!("{}\t({} hops)", route, route.hops());
    }
    if routes.is_empty() {
        println!("No route found.");
    }
    Ok(())
}
