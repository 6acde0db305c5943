//! Probe route planning.
//!
//! A probe flies a plotted course and reveals every sector it passes through,
//! so a good probe route threads as much unexplored space as possible on
//! its way to an unexplored dead end. Two planners are offered: a weighted
//! shortest path that makes explored sectors expensive, and an exhaustive
//! walk of bounded simple paths that scores every branch.

use super::bfs::backtrace;
use super::graph::{Route, WarpGraph};
use crate::model::SectorId;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// Cost of entering an explored sector. Unexplored sectors are free.
pub const EXPLORED_ENTRY_COST: u64 = 100;

/// Default caps for [`walk_probe_paths`].
pub const DEFAULT_MAX_HOPS: usize = 20;
pub const DEFAULT_MAX_EXPLORED: usize = 11;
pub const DEFAULT_SCORE_WINDOW: usize = 2;

/// Routes with more sectors than this are dropped by default.
pub const DEFAULT_MAX_ROUTE_LEN: usize = 21;

// ============================================================================
// Candidates
// ============================================================================

/// Destinations worth probing: unexplored dead ends, or `None` to let the
/// planner consider every sector.
pub fn probe_candidates(graph: &WarpGraph, all_sectors: bool) -> Option<Vec<SectorId>> {
    if all_sectors {
        return None;
    }
    Some(
        graph
            .dead_ends()
            .into_iter()
            .filter(|&s| !graph.is_explored(s))
            .collect(),
    )
}

// ============================================================================
// Weighted planner
// ============================================================================

/// Cheapest routes from `start` when entering an explored sector costs
/// [`EXPLORED_ENTRY_COST`] and entering an unexplored one costs nothing.
///
/// With `destinations` of `None`, every sector with known warps is a
/// destination. Avoided sectors are never entered. Unreachable destinations
/// are left out of the result; the start itself yields a one-sector route.
pub fn weighted_probe_paths(
    graph: &WarpGraph,
    start: SectorId,
    destinations: Option<&[SectorId]>,
    avoid: &HashSet<SectorId>,
) -> Vec<Route> {
    // ties settle in first-seen sector order, then by number
    let order: HashMap<SectorId, usize> = graph
        .sectors()
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, i))
        .collect();
    let rank = |s: SectorId| order.get(&s).copied().unwrap_or(usize::MAX);
    let entry_cost = |s: SectorId| {
        if graph.is_explored(s) {
            EXPLORED_ENTRY_COST
        } else {
            0
        }
    };

    let mut cost: HashMap<SectorId, u64> = HashMap::from([(start, 0)]);
    let mut parent: HashMap<SectorId, SectorId> = HashMap::new();
    let mut settled: HashSet<SectorId> = avoid.clone();
    let mut heap = BinaryHeap::from([Reverse((0u64, rank(start), start))]);

    while let Some(Reverse((current_cost, _, current))) = heap.pop() {
        if !settled.insert(current) {
            continue;
        }
        for next in graph.warps_from(current) {
            if settled.contains(&next) {
                continue;
            }
            let candidate = current_cost + entry_cost(next);
            if cost.get(&next).is_none_or(|&known| candidate < known) {
                cost.insert(next, candidate);
                parent.insert(next, current);
                heap.push(Reverse((candidate, rank(next), next)));
            }
        }
    }

    let destinations = destinations.unwrap_or(graph.sectors());
    destinations
        .iter()
        .filter(|&&d| d == start || parent.contains_key(&d))
        .map(|&d| backtrace(&parent, start, d, false))
        .collect()
}

// ============================================================================
// Exhaustive planner
// ============================================================================

/// Caps for the exhaustive walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    /// Longest prefix, in sectors, that may still be extended
    pub max_hops: usize,
    /// Most explored sectors a prefix may contain
    pub max_explored: usize,
    /// Keep branches scoring within this much of the best
    pub score_window: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            max_explored: DEFAULT_MAX_EXPLORED,
            score_window: DEFAULT_SCORE_WINDOW,
        }
    }
}

/// Shared path prefix. Every branch of the walk points at its parent's
/// node instead of copying the whole path.
struct PathNode {
    sector: SectorId,
    parent: Option<Rc<PathNode>>,
    len: usize,
    explored: usize,
}

fn prefix_len(prefix: &Option<Rc<PathNode>>) -> usize {
    prefix.as_ref().map_or(0, |n| n.len)
}

fn prefix_explored(prefix: &Option<Rc<PathNode>>) -> usize {
    prefix.as_ref().map_or(0, |n| n.explored)
}

fn prefix_contains(prefix: &Option<Rc<PathNode>>, sector: SectorId) -> bool {
    let mut node = prefix.as_deref();
    while let Some(n) = node {
        if n.sector == sector {
            return true;
        }
        node = n.parent.as_deref();
    }
    false
}

fn materialize(prefix: &Option<Rc<PathNode>>, last: SectorId) -> Vec<SectorId> {
    let mut path = Vec::with_capacity(prefix_len(prefix) + 1);
    path.push(last);
    let mut node = prefix.as_deref();
    while let Some(n) = node {
        path.push(n.sector);
        node = n.parent.as_deref();
    }
    path.reverse();
    path
}

/// How a branch of the walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchEnd {
    DeadEnd,
    HopLimit,
}

/// Enumerate bounded simple paths from `start` depth-first and keep the
/// ones that reveal the most unexplored sectors.
///
/// A branch ends at a sector with no unvisited warps out, or once its
/// prefix is longer than `max_hops` sectors. Prefixes holding more than
/// `max_explored` explored sectors are abandoned. Branches are kept when
/// they end on one of `destinations` (or anywhere, for `None`) and score
/// within `score_window` of the best branch. The result is sorted by score,
/// ascending.
pub fn walk_probe_paths(
    graph: &WarpGraph,
    start: SectorId,
    destinations: Option<&[SectorId]>,
    avoid: &HashSet<SectorId>,
    limits: WalkLimits,
) -> Vec<Route> {
    let wanted: Option<HashSet<SectorId>> = destinations.map(|d| d.iter().copied().collect());
    let is_wanted = |s: SectorId| wanted.as_ref().is_none_or(|w| w.contains(&s));

    let mut stack: Vec<(SectorId, Option<Rc<PathNode>>)> = vec![(start, None)];
    let mut results: Vec<(usize, BranchEnd, Vec<SectorId>)> = Vec::new();
    let (mut pruned, mut capped, mut dead_ends) = (0usize, 0usize, 0usize);

    while let Some((sector, prefix)) = stack.pop() {
        if avoid.contains(&sector) {
            continue;
        }
        if prefix_explored(&prefix) > limits.max_explored {
            pruned += 1;
            continue;
        }
        if prefix_len(&prefix) > limits.max_hops {
            capped += 1;
            if is_wanted(sector) {
                let path = materialize(&prefix, sector);
                results.push((graph.unexplored_count(&path), BranchEnd::HopLimit, path));
            }
            continue;
        }

        let node = Rc::new(PathNode {
            sector,
            len: prefix_len(&prefix) + 1,
            explored: prefix_explored(&prefix) + usize::from(graph.is_explored(sector)),
            parent: prefix,
        });
        let mut extended = false;
        for next in graph.warps_from(sector) {
            if next != sector && !prefix_contains(&node.parent, next) {
                stack.push((next, Some(Rc::clone(&node))));
                extended = true;
            }
        }
        if !extended {
            dead_ends += 1;
            if is_wanted(sector) {
                let path = materialize(&node.parent, sector);
                results.push((graph.unexplored_count(&path), BranchEnd::DeadEnd, path));
            }
        }
    }

    debug!(
        start,
        pruned,
        capped,
        dead_ends,
        kept = results.len(),
        "Probe walk finished"
    );

    let best = results.iter().map(|r| r.0).max().unwrap_or(0);
    results.sort_by_key(|r| r.0);
    results
        .into_iter()
        .filter(|(score, end, _)| {
            let keep = score + limits.score_window >= best;
            if keep {
                debug!(score, ?end, "Probe branch kept");
            }
            keep
        })
        .map(|(_, _, path)| Route(path))
        .collect()
}

// ============================================================================
// Selection and output
// ============================================================================

/// Routes that fit the length cap, how many were dropped, and how many
/// routes reveal each count of new sectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    pub usable: Vec<Route>,
    pub trimmed: usize,
    pub histogram: BTreeMap<usize, usize>,
}

/// Drop routes longer than `max_route_len` sectors (`None` keeps all) and
/// bucket the rest by unexplored count.
pub fn summarize_routes(
    graph: &WarpGraph,
    routes: Vec<Route>,
    max_route_len: Option<usize>,
) -> ProbeSummary {
    let mut summary = ProbeSummary::default();
    for route in routes {
        if max_route_len.is_some_and(|max| route.len() > max) {
            summary.trimmed += 1;
            continue;
        }
        *summary
            .histogram
            .entry(graph.unexplored_count(&route))
            .or_default() += 1;
        summary.usable.push(route);
    }
    summary
}

/// The `top` best routes by (unexplored count, length), best last.
pub fn select_top_routes(graph: &WarpGraph, mut routes: Vec<Route>, top: usize) -> Vec<Route> {
    routes.sort_by_key(|r| (graph.unexplored_count(r), r.len()));
    let skip = routes.len().saturating_sub(top);
    routes.split_off(skip)
}

/// Keystrokes that make the game's course plotter follow `route` exactly:
/// clear avoids, plot the course, avoid every warp that leaves the route,
/// then plot again to confirm.
pub fn probe_script(graph: &WarpGraph, route: &[SectorId]) -> Vec<String> {
    let (Some(&first), Some(&last)) = (route.first(), route.last()) else {
        return Vec::new();
    };
    let mut script = vec![
        "QQQQQQQQQNC".to_string(),
        "V0".to_string(),
        "YY".to_string(),
        format!("F{}", first),
        last.to_string(),
        "^".to_string(),
    ];
    for &sector in route {
        for warp in graph.warps_from(sector) {
            if !route.contains(&warp) {
                script.push(format!("S{}", warp));
            }
        }
    }
    script.push("Q".to_string());
    script.push(format!("F{}", first));
    script.push(last.to_string());
    script
}
