//! Map Store Module
//!
//! Persistence for everything learned from game sessions:
//! - SQLite schema and connection wrapper
//! - Write operations as values, and the sinks that accept them
//! - The in-memory settings cache

pub mod graph_store;
pub mod ops;
pub mod schema;
pub mod settings;

// Re-exports
pub use graph_store::{GraphStore, MapStats, StoreError};
pub use ops::{RecordingSink, WriteOp, WriteSink};
pub use schema::MAP_SCHEMA_VERSION;
pub use settings::{Settings, AUTO_HAGGLE_KEY, MAX_SECTOR_KEY, STARDOCK_KEY};
