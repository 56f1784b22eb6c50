//! Album record produced by a scan
//!
//! An album is a leaf directory holding at least one audio file, plus the
//! metadata and cover art derived from it.

use std::path::{Path, PathBuf};

/// A classified album directory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Album {
    /// Absolute path of the album directory, unique within one scan
    pub directory_path: PathBuf,
    /// Display title, falls back to the directory path
    pub title: String,
    /// Artist, possibly empty
    pub artist: String,
    /// Release year, 0 if unknown
    pub year: i32,
    /// Resolved cover image (sibling file or extracted temp file)
    pub cover_art_path: Option<PathBuf>,
    /// Audio files, sorted ascending by path
    pub audio_files: Vec<PathBuf>,
}

impl Album {
    pub fn has_cover_art(&self) -> bool {
        self.cover_art_path.is_some()
    }

    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            self.directory_path.to_string_lossy().into_owned()
        } else {
            self.title.clone()
        }
    }

    pub fn display_artist(&self) -> &str {
        &self.artist
    }

    pub fn cover_art(&self) -> Option<&Path> {
        self.cover_art_path.as_deref()
    }

    /// Check whether this album matches a search query
    ///
    /// Title, artist and path are compared case-insensitively. The year is
    /// matched against the query exactly as typed.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let needle = query.to_lowercase();

        if self.title.to_lowercase().contains(&needle)
            || self.artist.to_lowercase().contains(&needle)
            || self
                .directory_path
                .to_string_lossy()
                .to_lowercase()
                .contains(&needle)
        {
            return true;
        }

        self.year > 0 && query.contains(&self.year.to_string())
    }
}

/// Sort a catalog by case-insensitive title, keeping encounter order on ties
pub fn sort_catalog(albums: &mut [Album]) {
    albums.sort_by_cached_key(|album| album.title.to_lowercase());
}
