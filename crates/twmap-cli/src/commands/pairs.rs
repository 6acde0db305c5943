//! Pairs command - Nearby ports that trade with each other

use anyhow::{Context, Result};
use clap::Args;
use twmap_config::TwmapConfig;
use twmap_core::pathfind::{find_port_pairs, PairSearch, PortPairQuery};
use twmap_core::{ClassPattern, WarpGraph};

use super::open_store;

const DIRECT: &str = "  *** Direct warp available ***";

/// Arguments for the pairs command
#[derive(Args, Debug)]
pub struct PairsArgs {
    /// Port class pattern in Ore Org Equ order; the other port is the
    /// opposite unless both are given as "A-B" (e.g. "SBS-SSB")
    #[arg(long, short = 'p', default_value = "?BS")]
    port_type: String,

    /// Count federation space and the StarDock as safe warp-in points
    #[arg(long)]
    commissioned: bool,

    /// Most warps allowed between the two ports, each way
    #[arg(long, short = 's', default_value = "1")]
    separation: usize,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the pairs command
pub fn execute(args: PairsArgs, config: &TwmapConfig) -> Result<()> {
    let (pattern_a, pattern_b) = ClassPattern::parse_pair(&args.port_type)
        .with_context(|| format!("Invalid port type '{}'", args.port_type))?;

    let store = open_store(config)?;
    let graph = WarpGraph::load(&store).context("Failed to load warp graph")?;
    let ports = store.ports().context("Failed to load ports")?;
    let fighters = store.fighter_sectors()?;
    let blind_warps = store.blind_warps()?;

    let search = PairSearch {
        graph: &graph,
        ports: &ports,
        fighters: &fighters,
        blind_warps: &blind_warps,
        stardock: store.stardock()?,
    };
    let query = PortPairQuery {
        max_separation: args.separation,
        commissioned: args.commissioned,
        fedspace: config.routing.fedspace.clone(),
        ..PortPairQuery::new(pattern_a, pattern_b)
    };
    let pairs = find_port_pairs(&search, &query);

    if args.json {
        let output: Vec<_> = pairs
            .iter()
            .map(|pair| {
                let [a, b] = &pair.ports;
                let safe_routes: Vec<Option<&[u32]>> = pair
                    .access
                    .iter()
                    .map(|access| access.fighter_route.as_deref())
                    .collect();
                serde_json::json!({
                    "sectors": [a.sector, b.sector],
                    "classes": [a.class.as_str(), b.class.as_str()],
                    "score": pair.score,
                    "safe_routes": safe_routes,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for pair in &pairs {
        for (port, access) in pair.ports.iter().zip(&pair.access) {
            print!("{}", port);
            match &access.fighter_route {
                None => println!(),
                Some(route) if route.len() > 1 => println!(
                    "\n\t\tRoute from nearest safe warp ({} hops):\t{}",
                    route.hops(),
                    route
                ),
                Some(_) => println!("{}", DIRECT),
            }
            if let Some(route) = &access.blind_route {
                println!(
                    "\t\tNearest explored blind warp ({} hops):\t{}",
                    route.hops(),
                    route
                );
            }
        }
        println!();
    }
    Ok(())
}
