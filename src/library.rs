//! Album library scanning
//!
//! Handles:
//! - Directory name metadata extraction
//! - Cover art resolution (sibling images, embedded pictures)
//! - Album classification of leaf directories
//! - Cancellable two-pass background scanning

mod classifier;
mod cover;
mod metadata;
mod progress;
mod scanner;

pub use classifier::AlbumClassifier;
pub use cover::{COVER_FILENAMES, CoverArtResolver, embedded_art_path};
pub use metadata::{AlbumMetadata, extract_metadata};
pub use progress::{ScanHandle, ScanState, ScanStats};
pub use scanner::{ScanConfig, Scanner};

use std::fs::DirEntry;
use std::path::Path;

/// Audio extensions that make a directory an album candidate
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "flac", "mp3", "ogg", "opus", "m4a", "aac", "wav", "wv", "ape",
];

/// Image extensions accepted as cover art
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a path has a recognized audio extension
pub fn is_audio_file(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

/// Check if a path has a recognized image extension
pub fn is_image_file(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

/// Dotfiles, including macOS `._` resource fork sidecars
fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Directory entry is a directory, following symlinks
fn is_dir_entry(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Ok(ft) if ft.is_symlink() => entry.path().is_dir(),
        Ok(ft) => ft.is_dir(),
        Err(_) => false,
    }
}

/// Directory entry is a regular file, following symlinks
fn is_file_entry(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Ok(ft) if ft.is_symlink() => entry.path().is_file(),
        Ok(ft) => ft.is_file(),
        Err(_) => false,
    }
}

/// Visible regular file that is not a sidecar
fn is_visible_file(entry: &DirEntry) -> bool {
    !is_hidden(entry) && is_file_entry(entry)
}
