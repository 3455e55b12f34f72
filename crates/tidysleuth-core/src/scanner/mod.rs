/// Scanner module. Orchestrates filesystem scanning.
///
/// Every requested root is walked by the `jwalk` parallel walker on a
/// background thread, which writes into a **shared `LiveTree`**
/// (`Arc<RwLock<FileTree>>`). Callers either drain [`ScanHandle::progress_rx`]
/// themselves or call [`ScanHandle::wait`] to block until the tree is ready.
pub mod progress;
pub mod walker;

use crate::error::{Error, Result};
use crate::model::FileTree;
use progress::ScanProgress;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub use walker::is_excluded;

/// A shared, concurrently-readable file tree.
pub type LiveTree = Arc<RwLock<FileTree>>;

/// Maximum number of progress messages that may queue up in the channel.
///
/// If the consumer falls behind, the scanner blocks briefly on `send`
/// rather than consuming unbounded heap.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Directory names skipped by default.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".DS_Store",
    "tidysleuth-quarantine*",
];

/// Options controlling which entries a scan visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Path components to skip. See [`is_excluded`].
    pub exclude: Vec<String>,
    /// Visit dotfiles and dot-directories.
    pub include_hidden: bool,
    /// Maximum walk depth; `1` visits only the root's direct children.
    pub max_depth: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_owned()).collect(),
            include_hidden: false,
            max_depth: None,
        }
    }
}

/// Outcome of a finished scan.
#[derive(Debug)]
pub struct ScanSummary {
    pub tree: FileTree,
    pub duration: Duration,
    pub error_count: u64,
    pub symlinks_skipped: u64,
    /// Non-fatal errors reported while walking, as `(path, message)`.
    pub errors: Vec<(String, String)>,
}

/// Handle to a running or completed scan.
pub struct ScanHandle {
    /// Receiver for progress updates from the scan thread.
    pub progress_rx: Receiver<ScanProgress>,
    /// Shared tree populated incrementally during scanning.
    pub live_tree: LiveTree,
    cancel_flag: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// The flag shared with the scan thread, for wiring up signal handlers
    /// or later analysis passes.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    /// Block until the scan finishes and take ownership of the tree.
    ///
    /// Non-fatal errors are logged at `warn` and collected into the summary.
    pub fn wait(mut self) -> Result<ScanSummary> {
        let mut errors = Vec::new();
        let mut last_update = Instant::now();

        let outcome = loop {
            match self.progress_rx.recv_timeout(Duration::from_millis(250)) {
                Ok(ScanProgress::Update {
                    files_found,
                    total_size,
                    current_path,
                    ..
                }) => {
                    if last_update.elapsed() >= Duration::from_secs(2) {
                        info!(files = files_found, bytes = total_size, "scanning {current_path}");
                        last_update = Instant::now();
                    }
                }
                Ok(ScanProgress::Error { path, message }) => {
                    warn!("cannot read {path}: {message}");
                    errors.push((path, message));
                }
                Ok(ScanProgress::Complete {
                    duration,
                    error_count,
                    symlinks_skipped,
                }) => break Some((duration, error_count, symlinks_skipped)),
                Ok(ScanProgress::Cancelled) => break None,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };

        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("scanner thread panicked");
            }
        }

        let Some((duration, error_count, symlinks_skipped)) = outcome else {
            return Err(Error::Cancelled);
        };

        let tree = match Arc::try_unwrap(self.live_tree) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.read().clone(),
        };

        Ok(ScanSummary {
            tree,
            duration,
            error_count,
            symlinks_skipped,
            errors,
        })
    }
}

/// Start a new scan of `roots` on a background thread.
///
/// Roots are validated and canonicalised before the thread starts, so a
/// typo in a path fails fast instead of producing an empty tree.
pub fn start_scan(roots: Vec<PathBuf>, options: ScanOptions) -> Result<ScanHandle> {
    let mut canonical = Vec::with_capacity(roots.len());
    for root in roots {
        if !root.exists() {
            return Err(Error::RootNotFound(root));
        }
        if !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }
        let resolved = root.canonicalize().map_err(|e| Error::io(&root, e))?;
        // A root inside another root would be walked twice.
        if canonical.iter().any(|kept: &PathBuf| resolved.starts_with(kept)) {
            debug!(root = %resolved.display(), "root already covered by another root");
            continue;
        }
        canonical.retain(|kept: &PathBuf| {
            let covered = kept.starts_with(&resolved);
            if covered {
                debug!(root = %kept.display(), "root already covered by another root");
            }
            !covered
        });
        canonical.push(resolved);
    }

    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = Arc::clone(&cancel_flag);

    let live_tree: LiveTree = Arc::new(RwLock::new(FileTree::with_capacity(50_000)));
    let tree_clone = Arc::clone(&live_tree);

    let thread = thread::Builder::new()
        .name("tidysleuth-scanner".into())
        .spawn(move || {
            let start = Instant::now();
            let mut totals = walker::WalkTotals::default();

            for root in &canonical {
                if cancel_clone.load(Ordering::Relaxed) {
                    let _ = progress_tx.send(ScanProgress::Cancelled);
                    return;
                }
                info!("Scanning {}", root.display());
                let finished = walker::walk_root(
                    root,
                    &options,
                    &progress_tx,
                    &cancel_clone,
                    &tree_clone,
                    &mut totals,
                );
                if !finished {
                    debug!("scan cancelled during {}", root.display());
                    let _ = progress_tx.send(ScanProgress::Cancelled);
                    return;
                }
            }

            tree_clone.write().aggregate_sizes();

            let duration = start.elapsed();
            info!(
                files = totals.files,
                dirs = totals.dirs,
                errors = totals.errors,
                "scan complete in {duration:?}"
            );
            let _ = progress_tx.send(ScanProgress::Complete {
                duration,
                error_count: totals.errors,
                symlinks_skipped: totals.symlinks,
            });
        })
        .map_err(|e| Error::io("tidysleuth-scanner thread", e))?;

    Ok(ScanHandle {
        progress_rx,
        live_tree,
        cancel_flag,
        thread: Some(thread),
    })
}
