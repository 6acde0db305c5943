//! In-memory snapshot of the warp graph.
//!
//! Loaded fresh from the store for every planning run; nothing is cached
//! between runs. Neighbour iteration follows the order warps were first
//! recorded, which is what breaks ties in every search.

use crate::model::SectorId;
use crate::store::{GraphStore, StoreError};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;

/// An ordered list of sectors, start first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route(pub Vec<SectorId>);

impl Route {
    /// Warps travelled, one less than the number of sectors.
    pub fn hops(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn first(&self) -> Option<SectorId> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<SectorId> {
        self.0.last().copied()
    }

    pub fn into_inner(self) -> Vec<SectorId> {
        self.0
    }
}

impl Deref for Route {
    type Target = [SectorId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<SectorId>> for Route {
    fn from(sectors: Vec<SectorId>) -> Self {
        Route(sectors)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sector) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", sector)?;
        }
        Ok(())
    }
}

/// Directed warp graph plus the explored set.
#[derive(Debug, Clone, Default)]
pub struct WarpGraph {
    graph: DiGraphMap<SectorId, ()>,
    explored: HashSet<SectorId>,
    /// Sectors with at least one outgoing warp, in first-seen order
    sources: Vec<SectorId>,
}

impl WarpGraph {
    /// Snapshot the store's warps and explored set.
    pub fn load(store: &GraphStore) -> Result<Self, StoreError> {
        Ok(Self::from_edges(store.warps()?, store.explored_sectors()?))
    }

    pub fn from_edges(
        edges: impl IntoIterator<Item = (SectorId, SectorId)>,
        explored: impl IntoIterator<Item = SectorId>,
    ) -> Self {
        let mut graph = DiGraphMap::new();
        let mut sources = Vec::new();
        let mut seen_sources = HashSet::new();
        for (source, destination) in edges {
            if seen_sources.insert(source) {
                sources.push(source);
            }
            graph.add_edge(source, destination, ());
        }
        Self {
            graph,
            explored: explored.into_iter().collect(),
            sources,
        }
    }

    /// Sectors that have outgoing warps, in first-seen order.
    pub fn sectors(&self) -> &[SectorId] {
        &self.sources
    }

    pub fn contains(&self, sector: SectorId) -> bool {
        self.graph.contains_node(sector)
    }

    pub fn warp_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_warp(&self, from: SectorId, to: SectorId) -> bool {
        self.graph.contains_edge(from, to)
    }

    pub fn warps_from(&self, sector: SectorId) -> impl Iterator<Item = SectorId> + '_ {
        self.graph.neighbors_directed(sector, Direction::Outgoing)
    }

    pub fn warps_to(&self, sector: SectorId) -> impl Iterator<Item = SectorId> + '_ {
        self.graph.neighbors_directed(sector, Direction::Incoming)
    }

    /// Outgoing warps, or incoming ones when walking the graph backwards.
    pub fn next_hops(&self, sector: SectorId, reverse: bool) -> Vec<SectorId> {
        if reverse {
            self.warps_to(sector).collect()
        } else {
            self.warps_from(sector).collect()
        }
    }

    pub fn is_explored(&self, sector: SectorId) -> bool {
        self.explored.contains(&sector)
    }

    pub fn explored(&self) -> &HashSet<SectorId> {
        &self.explored
    }

    /// Sectors with exactly one warp out and one warp in.
    pub fn dead_ends(&self) -> Vec<SectorId> {
        self.sources
            .iter()
            .copied()
            .filter(|&s| self.warps_from(s).count() == 1 && self.warps_to(s).count() == 1)
            .collect()
    }

    pub fn unexplored_count(&self, sectors: &[SectorId]) -> usize {
        sectors.iter().filter(|s| !self.explored.contains(s)).count()
    }

    pub fn explored_count(&self, sectors: &[SectorId]) -> usize {
        sectors.len() - self.unexplored_count(sectors)
    }

    /// Sector number, parenthesised when unexplored.
    pub fn label(&self, sector: SectorId) -> String {
        if self.is_explored(sector) {
            sector.to_string()
        } else {
            format!("({})", sector)
        }
    }

    /// A route written with [`label`](Self::label) for each sector.
    pub fn describe(&self, route: &[SectorId]) -> String {
        route
            .iter()
            .map(|&s| self.label(s))
            .collect::<Vec<_>>()
            .join(" > ")
    }
}
