//! Route Planning
//!
//! Searches over a snapshot of the warp graph:
//! - Breadth-first shortest paths to any of several targets
//! - Probe planning, weighted and exhaustive
//! - Trading pair search

pub mod bfs;
pub mod graph;
pub mod ports;
pub mod probe;

// Re-exports
pub use bfs::{nearest, shortest_paths, BfsOptions};
pub use graph::{Route, WarpGraph};
pub use ports::{
    find_port_pairs, port_access, safe_sectors, PairScore, PairSearch, PortAccess, PortPair,
    PortPairQuery, FEDSPACE,
};
pub use probe::{
    probe_candidates, probe_script, select_top_routes, summarize_routes, walk_probe_paths,
    weighted_probe_paths, ProbeSummary, WalkLimits, DEFAULT_MAX_ROUTE_LEN,
};
