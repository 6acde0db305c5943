//! Split an arbitrarily chunked byte stream into lines.

use std::time::{Duration, Instant};
use tracing::debug;

/// Longest unterminated tail kept. Older bytes are discarded first, since a
/// prompt is always at the end.
pub const MAX_PENDING: usize = 64 * 1024;

/// Accumulates raw bytes and yields newline-terminated lines.
///
/// Carriage returns are dropped on arrival. The unterminated tail stays
/// buffered; it is handed out for partial-line classification at most once
/// per quiet period, i.e. once after bytes stop arriving for `debounce`.
#[derive(Debug, Default)]
pub struct LineSegmenter {
    pending: Vec<u8>,
    last_data: Option<Instant>,
    offered: bool,
}

impl LineSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without the `\n`.
    pub fn feed(&mut self, chunk: &[u8], now: Instant) -> Vec<Vec<u8>> {
        if chunk.is_empty() {
            return Vec::new();
        }
        self.last_data = Some(now);
        self.offered = false;

        self.pending.extend(chunk.iter().copied().filter(|&b| b != b'\r'));

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.pending[start..].iter().position(|&b| b == b'\n') {
            lines.push(self.pending[start..start + pos].to_vec());
            start += pos + 1;
        }
        self.pending.drain(..start);

        if self.pending.len() > MAX_PENDING {
            let excess = self.pending.len() - MAX_PENDING;
            debug!(excess, "Unterminated line too long, discarding its start");
            self.pending.drain(..excess);
        }
        lines
    }

    /// The buffered unterminated tail.
    pub fn remainder(&self) -> &[u8] {
        &self.pending
    }

    /// The tail, if the stream has been quiet for `debounce` and the tail has
    /// not been offered since the last data arrived.
    pub fn quiet_remainder(&mut self, now: Instant, debounce: Duration) -> Option<&[u8]> {
        if self.offered || self.pending.is_empty() {
            return None;
        }
        let last = self.last_data?;
        if now.saturating_duration_since(last) < debounce {
            return None;
        }
        self.offered = true;
        Some(&self.pending)
    }

    /// Take whatever is buffered, e.g. at end of a log file.
    pub fn take_remainder(&mut self) -> Vec<u8> {
        self.offered = false;
        std::mem::take(&mut self.pending)
    }
}
