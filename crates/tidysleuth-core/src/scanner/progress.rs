/// Scan progress reporting: lightweight messages sent from the scan
/// thread to the caller via a crossbeam channel.
use std::time::Duration;

/// Progress updates sent from the scan thread.
///
/// The tree itself lives in the shared `LiveTree`; these messages carry
/// only counters and status flags.
#[derive(Debug)]
pub enum ScanProgress {
    /// Periodic update with running totals.
    Update {
        files_found: u64,
        dirs_found: u64,
        total_size: u64,
        current_path: String,
    },
    /// A non-fatal error (e.g. permission denied on one directory).
    Error { path: String, message: String },
    /// Every root was walked. The finished tree is in the `LiveTree`.
    Complete {
        duration: Duration,
        error_count: u64,
        symlinks_skipped: u64,
    },
    /// Scan was cancelled.
    Cancelled,
}
