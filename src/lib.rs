//! Album shelf: a music-library album catalog
//!
//! Walks a music directory in the background, turns every leaf directory
//! holding audio files into an [`Album`] with title, artist, year and cover
//! art, and persists the catalog so the next start can show it immediately.

pub mod album;
pub mod cache;
pub mod library;
pub mod settings;
pub mod shelf;
pub mod thumbnails;

pub use album::{Album, sort_catalog};
pub use cache::{AlbumCache, CacheError};
pub use library::{
    AlbumClassifier, AlbumMetadata, CoverArtResolver, ScanConfig, ScanHandle, ScanState,
    ScanStats, Scanner, extract_metadata,
};
pub use settings::{Settings, SettingsError};
pub use shelf::AlbumShelf;
pub use thumbnails::CoverThumbnails;
