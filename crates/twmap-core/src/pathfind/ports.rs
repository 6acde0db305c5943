//! Trading pair search.
//!
//! A trading pair is two ports close enough to shuttle between, where each
//! buys what the other sells. Each end of a pair is annotated with the
//! nearest safe place to warp in from.

use super::bfs::{nearest, shortest_paths, BfsOptions};
use super::graph::{Route, WarpGraph};
use crate::model::{ClassPattern, Commodity, Port, SectorId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Federation space: always safe for a commissioned pilot.
pub const FEDSPACE: [SectorId; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPairQuery {
    pub pattern_a: ClassPattern,
    pub pattern_b: ClassPattern,
    /// Most warps allowed in each direction between the two ports
    pub max_separation: usize,
    /// Count federation space and the StarDock as safe entry points
    pub commissioned: bool,
    pub fedspace: Vec<SectorId>,
}

impl PortPairQuery {
    pub fn new(pattern_a: ClassPattern, pattern_b: ClassPattern) -> Self {
        Self {
            pattern_a,
            pattern_b,
            max_separation: 1,
            commissioned: false,
            fedspace: FEDSPACE.to_vec(),
        }
    }
}

/// Everything the search reads from the map.
#[derive(Debug, Clone, Copy)]
pub struct PairSearch<'a> {
    pub graph: &'a WarpGraph,
    pub ports: &'a [Port],
    pub fighters: &'a [SectorId],
    pub blind_warps: &'a [SectorId],
    pub stardock: Option<SectorId>,
}

/// Percent and amount totals over the commodities pattern A constrains.
/// Lower sorts first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PairScore {
    /// Both ports' percentages, summed
    pub percent: u32,
    /// The smaller of the two ports' amounts, summed
    pub amount: u32,
}

/// How to reach one end of a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortAccess {
    pub sector: SectorId,
    /// From the nearest fighter (or safe sector) to the port
    pub fighter_route: Option<Route>,
    /// From the nearest explored portless sector, when closer than any fighter
    pub blind_route: Option<Route>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPair {
    pub ports: [Port; 2],
    pub score: PairScore,
    pub access: [PortAccess; 2],
}

fn score(a: &Port, b: &Port, pattern: &ClassPattern) -> PairScore {
    let mut total = PairScore::default();
    for commodity in Commodity::ALL {
        if !pattern.constrains(commodity) {
            continue;
        }
        let (sa, sb) = (a.stock(commodity), b.stock(commodity));
        total.percent += sa.percent + sb.percent;
        total.amount += sa.amount.min(sb.amount);
    }
    total
}

/// True if `to` can be reached from `from` in at most `max` warps.
fn within(graph: &WarpGraph, from: SectorId, to: SectorId, max: usize) -> bool {
    if max <= 1 {
        return graph.has_warp(from, to);
    }
    nearest(graph, from, &[to], &HashSet::new(), false).is_some_and(|r| r.hops() <= max)
}

/// Find every unordered pair of ports matching the two patterns that can
/// reach each other both ways within the separation limit, lowest score
/// first.
pub fn find_port_pairs(search: &PairSearch<'_>, query: &PortPairQuery) -> Vec<PortPair> {
    let graph = search.graph;
    let by_sector: HashMap<SectorId, &Port> = search.ports.iter().map(|p| (p.sector, p)).collect();
    let b_sectors: Vec<SectorId> = search
        .ports
        .iter()
        .filter(|p| query.pattern_b.matches(p.class))
        .map(|p| p.sector)
        .collect();
    let b_set: HashSet<SectorId> = b_sectors.iter().copied().collect();
    let max = query.max_separation.max(1);

    let mut seen = HashSet::new();
    let mut candidates: Vec<(SectorId, SectorId)> = Vec::new();
    for a in search.ports.iter().filter(|p| query.pattern_a.matches(p.class)) {
        let outbound: Vec<SectorId> = if max == 1 {
            graph.warps_from(a.sector).filter(|s| b_set.contains(s)).collect()
        } else {
            shortest_paths(graph, a.sector, &b_sectors, &HashSet::new(), BfsOptions::all_targets())
                .into_iter()
                .filter(|r| r.hops() <= max)
                .filter_map(|r| r.last())
                .collect()
        };
        for b in outbound {
            if b == a.sector || !within(graph, b, a.sector, max) {
                continue;
            }
            let key = (a.sector.min(b), a.sector.max(b));
            if seen.insert(key) {
                candidates.push(key);
            }
        }
    }
    debug!(pairs = candidates.len(), "Port pairs found");

    let safe = safe_sectors(search, query);
    let mut pairs: Vec<PortPair> = candidates
        .into_iter()
        .filter_map(|(lo, hi)| {
            let (pa, pb) = (by_sector.get(&lo)?, by_sector.get(&hi)?);
            Some(PortPair {
                score: score(pa, pb, &query.pattern_a),
                access: [
                    port_access(graph, lo, &safe, search.blind_warps),
                    port_access(graph, hi, &safe, search.blind_warps),
                ],
                ports: [(*pa).clone(), (*pb).clone()],
            })
        })
        .collect();
    pairs.sort_by_key(|p| p.score);
    pairs
}

/// Fighter sectors, plus federation space and the StarDock when commissioned.
pub fn safe_sectors(search: &PairSearch<'_>, query: &PortPairQuery) -> Vec<SectorId> {
    let mut safe = search.fighters.to_vec();
    if query.commissioned {
        safe.extend(&query.fedspace);
        safe.extend(search.stardock);
    }
    safe
}

/// Nearest safe entry to `sector`, and the nearest blind warp if closer.
pub fn port_access(
    graph: &WarpGraph,
    sector: SectorId,
    safe: &[SectorId],
    blind_warps: &[SectorId],
) -> PortAccess {
    let none = HashSet::new();
    let fighter_route = if safe.is_empty() {
        None
    } else {
        nearest(graph, sector, safe, &none, true)
    };
    let blind_route = if blind_warps.is_empty() {
        None
    } else {
        nearest(graph, sector, blind_warps, &none, true)
            .filter(|b| fighter_route.as_ref().is_none_or(|f| b.len() < f.len()))
    };

    PortAccess {
        sector,
        fighter_route,
        blind_route,
    }
}
