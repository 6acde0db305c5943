//! Probe command - Ether probe routes through unexplored space

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;
use twmap_config::TwmapConfig;
use twmap_core::pathfind::{
    probe_candidates, probe_script, select_top_routes, summarize_routes, walk_probe_paths,
    weighted_probe_paths, WalkLimits,
};
use twmap_core::{Route, SectorId, WarpGraph};

use super::{avoid_set, open_store};

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Sectors the probe could be launched from
    starts: Vec<SectorId>,

    /// Exhaustive search: longer routes through more unexplored space, much slower
    #[arg(long, short = 't')]
    thorough: bool,

    /// How many recommended routes to show
    #[arg(long, default_value = "1")]
    top: usize,

    /// Treat every sector as a destination, not just unexplored dead ends
    #[arg(long, short = 'a')]
    all: bool,

    /// Sectors the probe must not pass through
    #[arg(long, short = 'x', num_args = 1..)]
    avoid: Vec<SectorId>,

    /// Also launch from every sector holding one of your fighters
    #[arg(long, short = 'f')]
    fighters: bool,

    /// Keep routes longer than the configured maximum
    #[arg(long, short = 'n')]
    no_trim: bool,
}

/// Execute the probe command
pub fn execute(args: ProbeArgs, config: &TwmapConfig) -> Result<()> {
    let store = open_store(config)?;
    let mut starts = args.starts.clone();
    if args.fighters {
        starts.extend(store.fighter_sectors()?);
    }
    if starts.is_empty() {
        bail!("No launch sectors given (pass sectors or --fighters)");
    }

    let graph = WarpGraph::load(&store).context("Failed to load warp graph")?;
    let avoid = avoid_set(&args.avoid);
    let candidates = probe_candidates(&graph, args.all);
    let limits = WalkLimits {
        max_hops: config.routing.probe_max_hops,
        max_explored: config.routing.probe_max_explored,
        score_window: config.routing.probe_score_window,
    };

    let mut routes: Vec<Route> = Vec::new();
    for &start in &starts {
        let found = if args.thorough {
            walk_probe_paths(&graph, start, candidates.as_deref(), &avoid, limits)
        } else {
            weighted_probe_paths(&graph, start, candidates.as_deref(), &avoid)
        };
        info!(start, routes = found.len(), "Probe routes planned");
        routes.extend(found);
    }

    let max_route_len = config.routing.max_route_len;
    let summary = summarize_routes(
        &graph,
        routes,
        (!args.no_trim).then_some(max_route_len),
    );

    if summary.trimmed > 0 {
        println!(
            "Trimmed {} routes that were over {} hops.",
            summary.trimmed, max_route_len
        );
    }
    for (new, count) in &summary.histogram {
        println!("Routes hitting {} new sectors: {}", new, count);
    }

    println!("\nRecommended route:");
    for route in select_top_routes(&graph, summary.usable, args.top) {
        println!(
            "new={} hops={}",
            graph.unexplored_count(&route),
            route.hops()
        );
        println!("{}", graph.describe(&route));
        println!();
        println!("Copy/Paste the following to set the probe's route:");
        for line in probe_script(&graph, &route) {
            println!("{}", line);
        }
        println!();
    }
    Ok(())
}
