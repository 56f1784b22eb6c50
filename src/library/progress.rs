//! Scan state tracking and cancellation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared state of the scan currently owned by a [`Scanner`](super::Scanner)
#[derive(Debug, Default)]
pub struct ScanState {
    /// A scan worker is active
    scanning: AtomicBool,
    /// Cancellation was requested for the active scan
    cancelled: AtomicBool,
    /// Directories visited in the walk pass
    directories: AtomicU64,
    /// Directories that passed the quick leaf/audio check
    candidates: AtomicU64,
    /// Candidates fully classified so far
    classified: AtomicU64,
    /// Albums produced so far
    albums: AtomicU64,
}

/// Snapshot of scan progress counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub directories: u64,
    pub candidates: u64,
    pub classified: u64,
    pub albums: u64,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the state for a new scan
    ///
    /// Returns `false` if another scan already holds it. On success the
    /// cancellation flag and counters are reset.
    pub(crate) fn try_begin(&self) -> bool {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        self.cancelled.store(false, Ordering::SeqCst);
        self.directories.store(0, Ordering::SeqCst);
        self.candidates.store(0, Ordering::SeqCst);
        self.classified.store(0, Ordering::SeqCst);
        self.albums.store(0, Ordering::SeqCst);
        true
    }

    pub(crate) fn finish(&self) {
        self.scanning.store(false, Ordering::SeqCst);
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn increment_directories(&self) {
        self.directories.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_candidates(&self) {
        self.candidates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_classified(&self) {
        self.classified.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_albums(&self) {
        self.albums.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            directories: self.directories.load(Ordering::Relaxed),
            candidates: self.candidates.load(Ordering::Relaxed),
            classified: self.classified.load(Ordering::Relaxed),
            albums: self.albums.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable handle for monitoring and cancelling scans from other threads
#[derive(Debug, Clone)]
pub struct ScanHandle {
    state: Arc<ScanState>,
}

impl ScanHandle {
    pub(crate) fn new(state: Arc<ScanState>) -> Self {
        Self { state }
    }

    /// Request cancellation of the active scan
    pub fn cancel(&self) {
        self.state.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    pub fn is_scanning(&self) -> bool {
        self.state.is_scanning()
    }

    pub fn stats(&self) -> ScanStats {
        self.state.stats()
    }
}
