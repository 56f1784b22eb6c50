//! Host-side album shelf
//!
//! Owns the catalog on behalf of a front end: shows the cached catalog at
//! startup, rescans in the background and persists results that differ
//! from what is already on screen.

use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use tokio::sync::oneshot;

use crate::album::Album;
use crate::cache::AlbumCache;
use crate::library::{AlbumClassifier, CoverArtResolver, ScanHandle, Scanner};
use crate::settings::Settings;
use crate::thumbnails::CoverThumbnails;

pub struct AlbumShelf {
    settings: Settings,
    cache: AlbumCache,
    scanner: Scanner,
    albums: Vec<Album>,
    thumbnails: CoverThumbnails,
}

impl AlbumShelf {
    /// Build a shelf from settings and load the cached catalog
    pub fn open(settings: Settings) -> Self {
        let cache = AlbumCache::new(settings.cache_path());
        let resolver = CoverArtResolver::new(settings.art_dir());
        let scanner = Scanner::new(AlbumClassifier::new(resolver), settings.scan.clone());
        let albums = cache.load(&settings.music_directory);

        Self {
            settings,
            cache,
            scanner,
            albums,
            thumbnails: CoverThumbnails::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn music_directory(&self) -> &std::path::Path {
        &self.settings.music_directory
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    /// Albums matching `query`, in catalog order
    pub fn filtered<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Album> + 'a {
        self.albums.iter().filter(move |album| album.matches(query))
    }

    pub fn is_scanning(&self) -> bool {
        self.scanner.is_scanning()
    }

    pub fn scan_handle(&self) -> ScanHandle {
        self.scanner.handle()
    }

    /// Start a background rescan of the music directory
    ///
    /// Returns `None` if a scan is already running. Feed the received
    /// catalog to [`apply_scan`](Self::apply_scan) on the thread that owns
    /// the shelf; the shelf accepts another refresh as soon as the catalog
    /// has been received.
    pub fn refresh(&self) -> Option<oneshot::Receiver<Vec<Album>>> {
        if self.scanner.is_scanning() {
            return None;
        }
        self.scanner.scan(self.settings.music_directory.clone())
    }

    /// Replace the catalog with a scan result
    ///
    /// Returns `false` if the result equals the current catalog; nothing is
    /// saved in that case.
    pub fn apply_scan(&mut self, albums: Vec<Album>) -> bool {
        if albums == self.albums {
            tracing::debug!("Scan result unchanged ({} albums)", albums.len());
            return false;
        }

        self.albums = albums;
        self.thumbnails.clear();

        if let Err(e) = self.cache.save(&self.settings.music_directory, &self.albums) {
            tracing::warn!("Failed to save album cache {:?}: {}", self.cache.path(), e);
        }
        true
    }

    /// Switch to another music directory
    ///
    /// Cancels any running scan and empties the catalog; call
    /// [`refresh`](Self::refresh) once the old scan has stopped.
    pub fn set_music_directory(&mut self, directory: PathBuf) {
        if directory == self.settings.music_directory {
            return;
        }

        self.scanner.cancel();
        self.settings.music_directory = directory;
        self.albums.clear();
        self.thumbnails.clear();

        if let Err(e) = self.settings.save() {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    /// Decoded cover for `album`, cached until the catalog changes
    pub fn thumbnail(&mut self, album: &Album) -> Option<Arc<RgbaImage>> {
        self.thumbnails.get(album)
    }
}
