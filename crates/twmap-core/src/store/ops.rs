//! Mutations of the map store as plain values.
//!
//! The parser never touches SQLite directly. It describes each change as a
//! [`WriteOp`] and hands it to a [`WriteSink`]: either the store itself (when
//! running on the thread that owns the connection) or the write queue.

use crate::model::{Planet, Port, SectorId};
use std::sync::Arc;

/// One queued change to the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// A warp-list report: mark `source` explored and add one edge per destination
    RecordWarps {
        source: SectorId,
        destinations: Vec<SectorId>,
    },
    /// A plotted course: one edge per consecutive pair, nothing marked explored
    RecordRoute { sectors: Vec<SectorId> },
    /// Replace the port row for its sector
    UpsertPort(Port),
    /// Replace the planet row for its id
    UpsertPlanet(Planet),
    /// A fighter scan started: forget every known fighter
    ClearFighters,
    /// One row of a fighter scan
    AddFighter(SectorId),
    /// Persist a changed setting
    SaveSetting { key: String, value: String },
}

impl WriteOp {
    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            WriteOp::RecordWarps { .. } => "record_warps",
            WriteOp::RecordRoute { .. } => "record_route",
            WriteOp::UpsertPort(_) => "upsert_port",
            WriteOp::UpsertPlanet(_) => "upsert_planet",
            WriteOp::ClearFighters => "clear_fighters",
            WriteOp::AddFighter(_) => "add_fighter",
            WriteOp::SaveSetting { .. } => "save_setting",
        }
    }
}

/// Destination for map mutations.
///
/// Implementations must not block the caller on storage I/O unless they are
/// the storage owner itself.
pub trait WriteSink {
    fn submit(&self, op: WriteOp);
}

impl<T: WriteSink + ?Sized> WriteSink for &T {
    fn submit(&self, op: WriteOp) {
        (**self).submit(op)
    }
}

impl<T: WriteSink + ?Sized> WriteSink for Arc<T> {
    fn submit(&self, op: WriteOp) {
        (**self).submit(op)
    }
}

/// Sink that only records what it was given. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    ops: parking_lot::Mutex<Vec<WriteOp>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything submitted so far, in order.
    pub fn ops(&self) -> Vec<WriteOp> {
        self.ops.lock().clone()
    }

    pub fn take(&self) -> Vec<WriteOp> {
        std::mem::take(&mut *self.ops.lock())
    }
}

impl WriteSink for RecordingSink {
    fn submit(&self, op: WriteOp) {
        self.ops.lock().push(op);
    }
}
