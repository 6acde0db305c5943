//! Single-writer queue for map mutations.
//!
//! Every mutation reaches SQLite through exactly one dedicated thread. Callers
//! on any other thread enqueue a [`WriteOp`] on an unbounded FIFO channel and
//! return immediately; code already running on the writer thread holds the
//! [`GraphStore`] itself, which applies operations synchronously.
//!
//! ```text
//! parser ──submit──▶ crossbeam unbounded ──try_recv──▶ writer thread ──▶ GraphStore
//!                          ▲
//!                   QueueMonitor (depth reports)
//! ```
//!
//! Shutdown is cooperative: [`WriteQueue::quit`] closes the queue to new
//! writes and raises a shared flag, and the writer exits only once it finds
//! the queue empty. Nothing already queued is dropped, and no timeout is
//! applied while draining. A write submitted after `quit` is refused with a
//! warning and counted in [`WriteQueue::rejected`].

use crate::store::{GraphStore, StoreError, WriteOp, WriteSink};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Terminal escape that briefly inverts the screen (visual bell).
pub const FLASH_SEQUENCE: &str = "\x1b[?5h\x1b[?5l";

/// Errors from managing the writer threads
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

/// Something the writer thread can apply operations to.
pub trait WriteTarget: Send + 'static {
    fn apply(&mut self, op: &WriteOp) -> Result<(), StoreError>;
}

impl WriteTarget for GraphStore {
    fn apply(&mut self, op: &WriteOp) -> Result<(), StoreError> {
        GraphStore::apply(self, op)
    }
}

/// Callback fired when a burst of more than one write has been drained.
pub type SettleHook = Box<dyn Fn(usize) + Send + 'static>;

/// Writer thread tuning.
pub struct WriterOptions {
    /// How long to wait for new work when the queue is empty
    pub idle_wait: Duration,
    pub on_settle: Option<SettleHook>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_secs(1),
            on_settle: None,
        }
    }
}

impl WriterOptions {
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    pub fn on_settle(mut self, hook: impl Fn(usize) + Send + 'static) -> Self {
        self.on_settle = Some(Box::new(hook));
        self
    }
}

/// Result of asking the queue to quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitStatus {
    /// Nothing was pending
    Idle,
    /// The writer is still draining this many operations
    Draining(usize),
}

/// Handle to the writer thread. Cheap to share behind an `Arc`.
pub struct WriteQueue {
    /// Taken by `quit`; a send and the quit flag never interleave.
    tx: RwLock<Option<Sender<WriteOp>>>,
    rx: Receiver<WriteOp>,
    quitting: Arc<AtomicBool>,
    rejected: AtomicUsize,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl WriteQueue {
    /// Move `target` onto a new writer thread and start consuming.
    pub fn spawn<T: WriteTarget>(target: T, options: WriterOptions) -> Result<Self, WriterError> {
        let (tx, rx) = unbounded();
        let quitting = Arc::new(AtomicBool::new(false));

        let worker_rx = rx.clone();
        let worker_quitting = Arc::clone(&quitting);
        let handle = thread::Builder::new()
            .name("twmap-writer".to_string())
            .spawn(move || run_writer(target, worker_rx, worker_quitting, options))
            .map_err(|source| WriterError::Spawn {
                name: "writer",
                source,
            })?;

        Ok(Self {
            tx: RwLock::new(Some(tx)),
            rx,
            quitting,
            rejected: AtomicUsize::new(0),
            writer: Mutex::new(Some(handle)),
        })
    }

    /// Number of operations queued but not yet applied.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::Acquire)
    }

    /// Writes refused because they arrived after `quit`.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Acquire)
    }

    /// Close the queue to new writes and ask the writer to exit once it is
    /// empty.
    pub fn quit(&self) -> QuitStatus {
        {
            let mut tx = self.tx.write();
            tx.take();
            self.quitting.store(true, Ordering::Release);
        }
        let pending = self.pending();
        if pending > 0 {
            info!(pending, "Waiting for database writes to finish");
            QuitStatus::Draining(pending)
        } else {
            QuitStatus::Idle
        }
    }

    /// Quit and block until every queued operation has been applied.
    pub fn shutdown(&self) -> Result<(), WriterError> {
        self.quit();
        let handle = self.writer.lock().take();
        match handle {
            Some(handle) => handle.join().map_err(|_| WriterError::Panicked("writer")),
            None => Ok(()),
        }
    }

    /// Start a monitor that periodically reports this queue's depth.
    pub fn monitor(&self, interval: Duration) -> Result<QueueMonitor, WriterError> {
        QueueMonitor::spawn(self.rx.clone(), Arc::clone(&self.quitting), interval)
    }
}

impl WriteSink for WriteQueue {
    fn submit(&self, op: WriteOp) {
        let tx = self.tx.read();
        let Some(tx) = tx.as_ref() else {
            self.rejected.fetch_add(1, Ordering::AcqRel);
            warn!(op = ?op, "Write submitted after quit, dropping");
            return;
        };
        // The queue owns a receiver, so the channel cannot be disconnected here.
        if let Err(e) = tx.send(op) {
            error!(op = ?e.0, "Write queue disconnected");
        }
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Writer shutdown failed: {}", e);
        }
    }
}

fn run_writer<T: WriteTarget>(
    mut target: T,
    rx: Receiver<WriteOp>,
    quitting: Arc<AtomicBool>,
    options: WriterOptions,
) {
    // Ops taken off the queue in the current burst, failed ones included
    let mut drained = 0usize;
    let apply = |target: &mut T, op: WriteOp, drained: &mut usize| {
        debug!("Applying {}: {:?}", op.name(), op);
        *drained += 1;
        if let Err(e) = target.apply(&op) {
            error!(op = ?op, error = %e, "Map write failed: {}", op.name());
        }
    };

    loop {
        // Read before popping: once the flag is seen, every accepted send is
        // already in the channel.
        let quit = quitting.load(Ordering::Acquire);
        match rx.try_recv() {
            Ok(op) => apply(&mut target, op, &mut drained),
            Err(err) => {
                if drained > 1 {
                    debug!(drained, "Write burst settled");
                    if let Some(ref hook) = options.on_settle {
                        hook(drained);
                    }
                }
                drained = 0;

                // quit drops the last sender, so disconnected means closed
                if quit || err == TryRecvError::Disconnected {
                    break;
                }
                match rx.recv_timeout(options.idle_wait) {
                    Ok(op) => apply(&mut target, op, &mut drained),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        }
    }
    debug!("Writer thread exiting");
}

/// Background thread that reports queue depth. It does no other work.
pub struct QueueMonitor {
    handle: Option<JoinHandle<()>>,
}

impl QueueMonitor {
    const TICK: Duration = Duration::from_millis(100);

    fn spawn(
        rx: Receiver<WriteOp>,
        quitting: Arc<AtomicBool>,
        interval: Duration,
    ) -> Result<Self, WriterError> {
        let handle = thread::Builder::new()
            .name("twmap-queue-monitor".to_string())
            .spawn(move || {
                let mut last_report = Instant::now();
                while !quitting.load(Ordering::Acquire) {
                    if last_report.elapsed() >= interval {
                        info!(queued = rx.len(), "Write queue depth");
                        last_report = Instant::now();
                    }
                    thread::sleep(Self::TICK.min(interval));
                }
            })
            .map_err(|source| WriterError::Spawn {
                name: "monitor",
                source,
            })?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the monitor to notice the quit flag.
    pub fn join(mut self) -> Result<(), WriterError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WriterError::Panicked("monitor")),
            None => Ok(()),
        }
    }
}
