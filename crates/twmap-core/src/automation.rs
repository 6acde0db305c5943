//! Scripted command sequences that run alongside a live session.
//!
//! A sequence sends one course-plot command at a time and waits for the
//! parser to finish recording the plot before sending the next. The two
//! sides meet through a [`RouteSignal`].

use crate::model::SectorId;
use parking_lot::{Condvar, Mutex};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Single-slot flag raised by the parser once a course plot is recorded.
#[derive(Debug, Default)]
pub struct RouteSignal {
    saved: Mutex<bool>,
    cond: Condvar,
}

impl RouteSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        *self.saved.lock() = true;
        self.cond.notify_all();
    }

    pub fn clear(&self) {
        *self.saved.lock() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.saved.lock()
    }

    /// Block until the signal is set. Checks `cancel` every `poll`; returns
    /// false if cancelled first.
    pub fn wait(&self, cancel: &AtomicBool, poll: Duration) -> bool {
        let mut saved = self.saved.lock();
        while !*saved {
            if cancel.load(Ordering::Acquire) {
                return false;
            }
            self.cond.wait_for(&mut saved, poll);
        }
        true
    }
}

/// How a scripted sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalOutcome {
    pub commands_sent: usize,
    pub cancelled: bool,
}

/// Plot a course between every sector and sector 1 in both directions, plus
/// between each pair of consecutive sectors, so the parser backfills warps
/// for the whole map.
#[derive(Debug, Clone)]
pub struct FullMapTraversal {
    max_sector: SectorId,
    poll: Duration,
}

impl FullMapTraversal {
    pub fn new(max_sector: SectorId) -> Self {
        Self {
            max_sector,
            poll: Duration::from_millis(100),
        }
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// The (from, to) course plots, in the order they are sent.
    pub fn plots(&self) -> impl Iterator<Item = (SectorId, SectorId)> {
        (2..=self.max_sector).flat_map(|x| [(1, x), (x, 1), (x - 1, x)])
    }

    /// Send every plot to `out`, waiting on `signal` after each.
    pub fn run<W: Write>(
        &self,
        out: &mut W,
        signal: &RouteSignal,
        cancel: &AtomicBool,
    ) -> io::Result<TraversalOutcome> {
        info!(max_sector = self.max_sector, "Starting full map traversal");
        let mut commands_sent = 0;

        for (from, to) in self.plots() {
            if cancel.load(Ordering::Acquire) {
                return Ok(self.cancelled(commands_sent));
            }
            signal.clear();
            write!(out, "F{}\r\n{}\r\n", from, to)?;
            out.flush()?;
            commands_sent += 1;
            debug!(from, to, "Plot requested");

            if !signal.wait(cancel, self.poll) {
                return Ok(self.cancelled(commands_sent));
            }
        }

        out.write_all(b"Q")?;
        out.flush()?;
        info!(commands_sent, "Full map traversal complete");
        Ok(TraversalOutcome {
            commands_sent,
            cancelled: false,
        })
    }

    fn cancelled(&self, commands_sent: usize) -> TraversalOutcome {
        info!(commands_sent, "Full map traversal cancelled");
        TraversalOutcome {
            commands_sent,
            cancelled: true,
        }
    }
}
