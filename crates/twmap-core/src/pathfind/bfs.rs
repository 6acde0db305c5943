//! Unweighted multi-target shortest paths.

use super::graph::{Route, WarpGraph};
use crate::model::SectorId;
use std::collections::{HashMap, HashSet, VecDeque};

/// Search flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BfsOptions {
    /// Walk warps backwards. Routes then run from the target found to the
    /// start, i.e. in the direction a ship would actually fly them.
    pub reverse: bool,
    /// Return a route to every reachable target instead of only the nearest
    pub all_targets: bool,
}

impl BfsOptions {
    pub fn reverse() -> Self {
        Self {
            reverse: true,
            ..Default::default()
        }
    }

    pub fn all_targets() -> Self {
        Self {
            all_targets: true,
            ..Default::default()
        }
    }
}

/// Breadth-first search from `start` toward any of `targets`.
///
/// Each sector's parent is the first sector that discovered it, and
/// neighbours are expanded in stored warp order, so ties resolve the same
/// way on every run. Avoided sectors are never entered; targets reachable
/// only through them are absent from the result. The start itself is a
/// target hit with zero hops when listed.
pub fn shortest_paths(
    graph: &WarpGraph,
    start: SectorId,
    targets: &[SectorId],
    avoid: &HashSet<SectorId>,
    options: BfsOptions,
) -> Vec<Route> {
    let targets: HashSet<SectorId> = targets.iter().copied().collect();
    let mut routes = Vec::new();
    if targets.is_empty() {
        return routes;
    }

    let mut parent: HashMap<SectorId, SectorId> = HashMap::new();
    let mut seen: HashSet<SectorId> = avoid.clone();
    seen.insert(start);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if targets.contains(&current) {
            routes.push(backtrace(&parent, start, current, options.reverse));
            if !options.all_targets {
                break;
            }
        }
        for next in graph.next_hops(current, options.reverse) {
            if seen.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    routes
}

/// Nearest of `targets` from `start`, if any is reachable.
pub fn nearest(
    graph: &WarpGraph,
    start: SectorId,
    targets: &[SectorId],
    avoid: &HashSet<SectorId>,
    reverse: bool,
) -> Option<Route> {
    let options = BfsOptions {
        reverse,
        all_targets: false,
    };
    shortest_paths(graph, start, targets, avoid, options)
        .into_iter()
        .next()
}

/// Follow parents from `end` back to `start`. The result runs start to end,
/// or end to start when `reverse` is set.
pub(crate) fn backtrace(
    parent: &HashMap<SectorId, SectorId>,
    start: SectorId,
    end: SectorId,
    reverse: bool,
) -> Route {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match parent.get(&current) {
            Some(&p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }
    if !reverse {
        path.reverse();
    }
    Route(path)
}
