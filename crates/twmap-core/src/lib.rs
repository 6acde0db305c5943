//! twmap core - live session mapping for TradeWars 2002
//!
//! This crate provides everything between the raw game stream and a route:
//! - Stream parsing of ANSI game output into map facts
//! - Haggle and login suggestions for prompts that never end in a newline
//! - A SQLite map store written from a single dedicated thread
//! - Shortest path, probe and trading pair searches over the warp graph

pub mod automation;
pub mod model;
pub mod parser;
pub mod pathfind;
pub mod store;
pub mod writer;

// Model re-exports
pub use model::{
    ClassPattern, Commodity, ModelError, Planet, Port, PortClass, SectorId, Stance, Stock,
};

// Store re-exports
pub use store::{GraphStore, MapStats, RecordingSink, Settings, StoreError, WriteOp, WriteSink};

// Writer re-exports
pub use writer::{QueueMonitor, QuitStatus, WriteQueue, WriteTarget, WriterError, WriterOptions};

// Parser re-exports
pub use parser::{
    LineKind, LoginScript, Negotiation, SessionContext, StreamParser, Suggestion, SuggestionKind,
};

// Automation re-exports
pub use automation::{FullMapTraversal, RouteSignal, TraversalOutcome};

// Route planning re-exports
pub use pathfind::{Route, WarpGraph};
