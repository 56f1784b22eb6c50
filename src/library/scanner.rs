//! Background album scanner
//!
//! Walks a music directory tree on a dedicated worker thread in two passes:
//! a cheap walk that collects leaf directories containing audio files, then
//! full classification (metadata + cover art) of those candidates only.
//! Cancellation is cooperative and polled between walk entries and before
//! each classification, so a cancelled scan stops without paying for tag
//! parsing on directories it would discard anyway.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use walkdir::WalkDir;

use super::classifier::AlbumClassifier;
use super::progress::{ScanHandle, ScanState, ScanStats};
use crate::album::{Album, sort_catalog};

/// Walk configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Descend into symlinked directories
    pub follow_links: bool,
    /// Maximum depth below the root (None = unlimited)
    pub max_depth: Option<usize>,
}

/// Album scanner running at most one background scan at a time
pub struct Scanner {
    classifier: Arc<AlbumClassifier>,
    config: ScanConfig,
    state: Arc<ScanState>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(AlbumClassifier::default(), ScanConfig::default())
    }
}

impl Scanner {
    pub fn new(classifier: AlbumClassifier, config: ScanConfig) -> Self {
        Self {
            classifier: Arc::new(classifier),
            config,
            state: Arc::new(ScanState::new()),
            worker: Mutex::new(None),
        }
    }

    /// Start scanning `root` in the background
    ///
    /// `on_complete` runs on the worker thread with the sorted catalog,
    /// unless the scan is cancelled, in which case it is never called. The
    /// scanner is idle again by the time `on_complete` runs, so the callback
    /// (or whoever it notifies) may start the next scan right away.
    ///
    /// Returns `false` without doing anything if a scan is already running.
    /// Starting a scan waits for the previous completion callback to return.
    pub fn scan_async<F>(&self, root: impl Into<PathBuf>, on_complete: F) -> bool
    where
        F: FnOnce(Vec<Album>) + Send + 'static,
    {
        if !self.state.try_begin() {
            tracing::debug!("Scan already in progress, ignoring request");
            return false;
        }

        let mut worker = self.worker.lock();
        if let Some(previous) = worker.take() {
            join_worker(previous);
        }

        let root = root.into();
        let classifier = self.classifier.clone();
        let config = self.config.clone();
        let state = self.state.clone();

        let spawned = thread::Builder::new()
            .name("album-scanner".to_string())
            .spawn(move || {
                run_worker(&root, &classifier, &config, &state, on_complete);
            });

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                true
            }
            Err(e) => {
                tracing::error!("Failed to spawn scan thread: {}", e);
                self.state.finish();
                false
            }
        }
    }

    /// Start scanning `root`, delivering the catalog through a oneshot channel
    ///
    /// Returns `None` if a scan is already running. If the scan is
    /// cancelled the sender is dropped and the receiver reports closure.
    /// Once the catalog is received a new scan can be started.
    pub fn scan(&self, root: impl Into<PathBuf>) -> Option<oneshot::Receiver<Vec<Album>>> {
        let (tx, rx) = oneshot::channel();
        let started = self.scan_async(root, move |albums| {
            let _ = tx.send(albums);
        });
        started.then_some(rx)
    }

    /// Request cancellation of the running scan
    pub fn cancel(&self) {
        self.state.cancel();
    }

    pub fn is_scanning(&self) -> bool {
        self.state.is_scanning()
    }

    pub fn stats(&self) -> ScanStats {
        self.state.stats()
    }

    /// Handle for cancelling or polling from another thread
    pub fn handle(&self) -> ScanHandle {
        ScanHandle::new(self.state.clone())
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.cancel();
        if let Some(worker) = self.worker.get_mut().take() {
            join_worker(worker);
        }
    }
}

/// Join a finished worker unless it is the calling thread
///
/// A completion callback that starts the next scan (or drops the last
/// reference to the scanner) runs on the worker being replaced.
fn join_worker(worker: JoinHandle<()>) {
    if worker.thread().id() == thread::current().id() {
        return;
    }
    if worker.join().is_err() {
        tracing::warn!("Previous scan worker panicked");
    }
}

/// Marks the scan finished when dropped, even on panic
struct FinishGuard<'a>(&'a ScanState);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Worker body: scan, mark the scanner idle, then deliver
///
/// Cancellation is checked before the scanner is marked idle, so a cancel
/// issued at any point during the scan suppresses delivery.
fn run_worker<F>(
    root: &Path,
    classifier: &AlbumClassifier,
    config: &ScanConfig,
    state: &ScanState,
    on_complete: F,
) -> bool
where
    F: FnOnce(Vec<Album>),
{
    let albums = {
        let _finish = FinishGuard(state);
        run_scan(root, classifier, config, state).filter(|_| !state.is_cancelled())
    };

    match albums {
        Some(albums) => {
            on_complete(albums);
            true
        }
        None => {
            tracing::info!("Scan cancelled, discarding results");
            false
        }
    }
}

/// Scan `root` into a sorted catalog, `None` if cancelled
fn run_scan(
    root: &Path,
    classifier: &AlbumClassifier,
    config: &ScanConfig,
    state: &ScanState,
) -> Option<Vec<Album>> {
    if !root.is_dir() {
        tracing::error!("Music directory does not exist: {:?}", root);
        return Some(Vec::new());
    }

    let start_time = Instant::now();
    tracing::info!("Scanning {:?} for albums", root);

    let candidates = collect_candidates(root, classifier, config, state)?;
    tracing::debug!(
        "Found {} candidate directories in {} ms",
        candidates.len(),
        start_time.elapsed().as_millis()
    );

    let mut albums = Vec::with_capacity(candidates.len());
    for directory in candidates {
        if state.is_cancelled() {
            return None;
        }

        if let Some(album) = classifier.classify(&directory) {
            state.increment_albums();
            albums.push(album);
        }
        state.increment_classified();
    }

    sort_catalog(&mut albums);

    tracing::info!(
        "Found {} albums in {:?} ({} ms)",
        albums.len(),
        root,
        start_time.elapsed().as_millis()
    );

    Some(albums)
}

/// First pass: every directory under `root` that looks like an album
fn collect_candidates(
    root: &Path,
    classifier: &AlbumClassifier,
    config: &ScanConfig,
    state: &ScanState,
) -> Option<Vec<PathBuf>> {
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(config.follow_links);

    if let Some(max_depth) = config.max_depth {
        walker = walker.max_depth(max_depth);
    }

    let mut candidates = Vec::new();

    for entry in walker {
        if state.is_cancelled() {
            return None;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };

        let is_dir = entry.file_type().is_dir()
            || (entry.path_is_symlink() && entry.path().is_dir());
        if !is_dir {
            continue;
        }

        state.increment_directories();
        if classifier.is_candidate(entry.path()) {
            state.increment_candidates();
            candidates.push(entry.into_path());
        }
    }

    Some(candidates)
}
