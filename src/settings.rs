//! Host settings persistence
//!
//! Handles saving and loading the music directory and storage locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::AlbumCache;
use crate::library::ScanConfig;

/// Album shelf settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the music tree to scan
    pub music_directory: PathBuf,
    /// Catalog cache file (None = per-user cache directory)
    pub cache_file: Option<PathBuf>,
    /// Where embedded cover art is extracted (None = system temp dir)
    pub art_temp_dir: Option<PathBuf>,
    /// Directory walk options
    pub scan: ScanConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_directory: default_music_directory(),
            cache_file: None,
            art_temp_dir: None,
            scan: ScanConfig::default(),
        }
    }
}

/// The user's audio directory, or `~/Music`
fn default_music_directory() -> PathBuf {
    let user_dirs = directories::UserDirs::new();
    user_dirs
        .as_ref()
        .and_then(|dirs| dirs.audio_dir().map(Path::to_path_buf))
        .or_else(|| user_dirs.as_ref().map(|dirs| dirs.home_dir().join("Music")))
        .unwrap_or_else(|| PathBuf::from("Music"))
}

impl Settings {
    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "album-shelf", "AlbumShelf")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return defaults if not found
    pub fn load() -> Self {
        Self::file_path()
            .and_then(|path| match Self::load_from_file(&path) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    tracing::debug!("Using default settings ({})", e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::file_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to_file(&path)
    }

    /// Save settings to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Effective cache file location
    pub fn cache_path(&self) -> PathBuf {
        self.cache_file.clone().unwrap_or_else(AlbumCache::default_path)
    }

    /// Effective embedded art directory
    pub fn art_dir(&self) -> PathBuf {
        self.art_temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Errors that can occur with settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}
