//! Decoded cover thumbnails
//!
//! Keeps one decoded, downscaled cover per album directory so a host
//! redrawing its grid does not decode the same image repeatedly. The whole
//! cache is dropped whenever the catalog changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};

use crate::album::Album;

/// Default thumbnail size (width and height)
pub const THUMBNAIL_SIZE: u32 = 300;

/// Cover thumbnails keyed by album directory
#[derive(Debug)]
pub struct CoverThumbnails {
    size: u32,
    /// `None` records a failed decode so it is not retried
    entries: HashMap<PathBuf, Option<Arc<RgbaImage>>>,
}

impl Default for CoverThumbnails {
    fn default() -> Self {
        Self::new(THUMBNAIL_SIZE)
    }
}

impl CoverThumbnails {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            entries: HashMap::new(),
        }
    }

    /// Thumbnail for `album`, decoding on first request
    ///
    /// Returns `None` for albums without usable cover art; the host draws a
    /// placeholder instead.
    pub fn get(&mut self, album: &Album) -> Option<Arc<RgbaImage>> {
        if let Some(entry) = self.entries.get(&album.directory_path) {
            return entry.clone();
        }

        let thumbnail = album.cover_art().and_then(|path| match self.decode(path) {
            Ok(img) => Some(Arc::new(img)),
            Err(e) => {
                tracing::warn!("Failed to load cover {:?}: {:#}", path, e);
                None
            }
        });

        self.entries
            .insert(album.directory_path.clone(), thumbnail.clone());
        thumbnail
    }

    /// Decode by content, not extension: extracted embedded art is always
    /// named `.jpg` even when it holds PNG data
    fn decode(&self, path: &Path) -> Result<RgbaImage> {
        let img = ImageReader::open(path)
            .context("Failed to open cover image")?
            .with_guessed_format()
            .context("Failed to read cover image")?
            .decode()
            .context("Failed to decode cover image")?;

        Ok(img
            .resize(self.size, self.size, FilterType::Lanczos3)
            .to_rgba8())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
