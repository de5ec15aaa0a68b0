//! Scan coordinator and matcher worker pool.
//!
//! ```text
//! walker (calling thread) ──► bounded path queue (capacity = workers)
//!                                   │
//!                                   ├── worker 0: recv → classify → on_match
//!                                   ├── worker 1: recv → classify → on_match
//!                                   └── worker N: recv → classify → on_match
//! ```
//!
//! The queue gives backpressure: the walker blocks while every worker is busy.
//! Workers share a stop flag raised when a callback returns `false`; once all
//! of them have exited, the closed queue ends the walk as well.

use crate::cancel::CancellationToken;
use crate::config::ScanOptions;
use crate::error::{Result, ScanError, WorkerFault};
use crate::matcher::classify;
use crate::signature::{Signature, validate};
use crate::walker::walk;
use crossbeam_channel::{Receiver, bounded};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Summary of a finished scan.
///
/// Matches themselves are only delivered through the callback.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub files_queued: u64,
    pub files_scanned: u64,
    pub matches: u64,
    pub walk_errors: u64,
    /// A callback asked the scan to stop before the tree was exhausted.
    pub stopped_early: bool,
    pub faults: Vec<WorkerFault>,
    pub elapsed: Duration,
}

#[derive(Default)]
struct ScanState {
    stop: AtomicBool,
    files_scanned: AtomicU64,
    matches: AtomicU64,
    interrupted: Mutex<Option<ScanError>>,
    faults: Mutex<Vec<WorkerFault>>,
}

impl ScanState {
    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Records the token's error, if any. Only consulted with an item in
    /// hand, so a scan that drained its queue is never reported as
    /// interrupted.
    fn token_allows(&self, token: &CancellationToken) -> bool {
        if let Err(e) = token.check() {
            self.interrupted.lock().get_or_insert(e);
            return false;
        }
        true
    }
}

fn require_workers(started: usize) -> Result<()> {
    if started == 0 {
        return Err(ScanError::NoWorkers);
    }
    Ok(())
}

/// Runs signature scans over directory trees.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scans every regular file under `root` against `signatures`.
    ///
    /// `on_match` receives the path and the name of the first matching
    /// signature. It runs on worker threads, possibly concurrently, and
    /// returning `false` stops the whole scan. Returns once the walk is over
    /// and every worker has exited.
    ///
    /// # Errors
    ///
    /// * [`ScanError::TooManySignatures`] before any filesystem access.
    /// * [`ScanError::Cancelled`] / [`ScanError::DeadlineExceeded`] when the
    ///   token fires before or during the scan.
    /// * [`ScanError::NoWorkers`] when no worker thread could be spawned.
    pub fn search<F>(
        &self,
        token: &CancellationToken,
        root: impl AsRef<Path>,
        signatures: &[Signature],
        on_match: F,
    ) -> Result<ScanReport>
    where
        F: Fn(&Path, &str) -> bool + Sync,
    {
        validate(signatures)?;

        if signatures.is_empty() {
            debug!("Empty signature list, skipping scan");
            return Ok(ScanReport::default());
        }

        let root = root.as_ref();
        let start_time = Instant::now();
        let num_workers = self.options.workers.max(1);
        let state = ScanState::default();

        info!(
            "Scanning {} for {} signatures with {} workers",
            root.display(),
            signatures.len(),
            num_workers
        );

        let (path_tx, path_rx) = bounded::<PathBuf>(self.options.queue_capacity());

        let walk_result = thread::scope(|scope| {
            let mut started = 0usize;
            for worker_id in 0..num_workers {
                let rx = path_rx.clone();
                let state = &state;
                let on_match = &on_match;

                let spawned = thread::Builder::new()
                    .name(format!("magicscan-worker-{}", worker_id))
                    .spawn_scoped(scope, move || {
                        worker_loop(worker_id, rx, signatures, on_match, token, state);
                    });

                match spawned {
                    Ok(_) => started += 1,
                    Err(e) => error!("Failed to spawn worker {}: {}", worker_id, e),
                }
            }

            drop(path_rx);
            require_workers(started)?;
            let result = walk(root, &path_tx, token);
            drop(path_tx);
            result
        });

        let walk_stats = walk_result?;

        if let Some(e) = state.interrupted.lock().take() {
            return Err(e);
        }

        let report = ScanReport {
            files_queued: walk_stats.files_published,
            files_scanned: state.files_scanned.load(Ordering::SeqCst),
            matches: state.matches.load(Ordering::SeqCst),
            walk_errors: walk_stats.errors,
            stopped_early: state.stop.load(Ordering::SeqCst),
            faults: std::mem::take(&mut *state.faults.lock()),
            elapsed: start_time.elapsed(),
        };

        info!(
            "Scan finished in {:.2}s: {} files scanned, {} matches, {} faults",
            report.elapsed.as_secs_f64(),
            report.files_scanned,
            report.matches,
            report.faults.len()
        );

        Ok(report)
    }
}

/// Scans `root` with default [`ScanOptions`].
///
/// See [`Scanner::search`].
pub fn search<F>(
    token: &CancellationToken,
    root: impl AsRef<Path>,
    signatures: &[Signature],
    on_match: F,
) -> Result<ScanReport>
where
    F: Fn(&Path, &str) -> bool + Sync,
{
    Scanner::default().search(token, root, signatures, on_match)
}

fn worker_loop<F>(
    worker_id: usize,
    queue: Receiver<PathBuf>,
    signatures: &[Signature],
    on_match: &F,
    token: &CancellationToken,
    state: &ScanState,
) where
    F: Fn(&Path, &str) -> bool + Sync,
{
    while !state.is_stopped() {
        let Ok(path) = queue.recv() else {
            break;
        };

        if state.is_stopped() || !state.token_allows(token) {
            break;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            classify(&path, signatures).map(|sig| on_match(&path, sig.name()))
        }));
        state.files_scanned.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Ok(None) => {}
            Ok(Some(keep_going)) => {
                state.matches.fetch_add(1, Ordering::Relaxed);
                if !keep_going {
                    debug!("Worker {} stopping scan at {}", worker_id, path.display());
                    state.stop.store(true, Ordering::SeqCst);
                    break;
                }
            }
            Err(payload) => {
                let fault = WorkerFault {
                    worker: worker_id,
                    path,
                    message: panic_message(payload.as_ref()),
                };
                error!("{}", fault);
                state.faults.lock().push(fault);
            }
        }
    }

    debug!("Worker {} exiting", worker_id);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
