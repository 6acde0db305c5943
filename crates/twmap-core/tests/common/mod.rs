//! Common test utilities for integration tests.
//!
//! Builders for small hand-made maps and for synthetic session logs.

#![allow(dead_code)]

use twmap_core::{GraphStore, Port, PortClass, SectorId, Stock, WarpGraph};

/// A map store populated step by step.
pub struct MapFixture {
    pub store: GraphStore,
}

impl MapFixture {
    pub fn new() -> Self {
        Self {
            store: GraphStore::in_memory().expect("Failed to create in-memory store"),
        }
    }

    pub fn warps(self, edges: &[(SectorId, SectorId)]) -> Self {
        for &(source, destination) in edges {
            self.store
                .upsert_warp(source, destination)
                .expect("Failed to add warp");
        }
        self
    }

    /// Warps in both directions for every pair.
    pub fn two_way(self, edges: &[(SectorId, SectorId)]) -> Self {
        let both: Vec<_> = edges.iter().flat_map(|&(a, b)| [(a, b), (b, a)]).collect();
        self.warps(&both)
    }

    pub fn explored(self, sectors: &[SectorId]) -> Self {
        for &sector in sectors {
            self.store
                .mark_explored(sector)
                .expect("Failed to mark explored");
        }
        self
    }

    pub fn port(self, sector: SectorId, class: PortClass, amount: u32, percent: u32) -> Self {
        let stock = Stock { amount, percent };
        self.store
            .upsert_port(&Port {
                sector,
                class,
                ore: stock,
                organics: stock,
                equipment: stock,
                last_seen: None,
            })
            .expect("Failed to add port");
        self
    }

    pub fn fighters(self, sectors: &[SectorId]) -> Self {
        for &sector in sectors {
            self.store.add_fighter(sector).expect("Failed to add fighter");
        }
        self
    }

    pub fn graph(&self) -> WarpGraph {
        WarpGraph::load(&self.store).expect("Failed to load warp graph")
    }
}

/// Join lines the way the game sends them, CR LF terminated.
pub fn session_bytes(lines: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Wrap text in a colour escape and a reset, as the game does.
pub fn coloured(text: &str) -> String {
    format!("\x1b[1;36m{}\x1b[0m", text)
}
