//! Album classification of leaf directories

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::cover::CoverArtResolver;
use super::metadata::extract_metadata;
use super::{is_audio_file, is_dir_entry, is_visible_file};
use crate::album::Album;

/// Decides whether a directory is an album and builds its record
#[derive(Debug, Clone, Default)]
pub struct AlbumClassifier {
    resolver: CoverArtResolver,
}

impl AlbumClassifier {
    pub fn new(resolver: CoverArtResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &CoverArtResolver {
        &self.resolver
    }

    /// Quick check: a leaf directory with at least one audio file
    ///
    /// Reads the directory listing only, no tags or images.
    pub fn is_candidate(&self, directory: &Path) -> bool {
        let entries = match read_entries(directory) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot read directory {:?}: {}", directory, e);
                return false;
            }
        };

        if entries.iter().any(is_dir_entry) {
            return false;
        }

        entries
            .iter()
            .any(|entry| is_visible_file(entry) && is_audio_file(&entry.path()))
    }

    /// Classify `directory`, returning `None` if it is not an album
    pub fn classify(&self, directory: &Path) -> Option<Album> {
        if !self.is_candidate(directory) {
            return None;
        }

        let audio_files = match collect_audio_files(directory) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Cannot read directory {:?}: {}", directory, e);
                return None;
            }
        };

        // Files can vanish between the candidate check and the listing
        if audio_files.is_empty() {
            tracing::debug!("No audio files left in {:?}, skipping", directory);
            return None;
        }

        let metadata = extract_metadata(directory);
        let title = if metadata.title.is_empty() {
            directory.to_string_lossy().into_owned()
        } else {
            metadata.title
        };

        let cover_art_path = self.resolver.resolve(directory, &audio_files);

        Some(Album {
            directory_path: directory.to_path_buf(),
            title,
            artist: metadata.artist,
            year: metadata.year,
            cover_art_path,
            audio_files,
        })
    }
}

fn read_entries(directory: &Path) -> io::Result<Vec<fs::DirEntry>> {
    fs::read_dir(directory)?.collect()
}

/// Visible audio files of `directory`, sorted by full path
fn collect_audio_files(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = read_entries(directory)?
        .into_iter()
        .filter(is_visible_file)
        .map(|entry| entry.path())
        .filter(|path| is_audio_file(path))
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    fn classifier(temp: &TempDir) -> AlbumClassifier {
        AlbumClassifier::new(CoverArtResolver::new(temp.path().join("art")))
    }

    #[test]
    fn test_classifies_leaf_album() {
        let root = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let dir = root.path().join("Pink Floyd").join("(1979) The Wall");
        fs::create_dir_all(&dir).unwrap();
        touch(&dir.join("02 - Another Brick.flac"));
        touch(&dir.join("01 - In The Flesh.FLAC"));
        touch(&dir.join("album.cue"));
        touch(&dir.join("cover.jpg"));

        let album = classifier(&temp).classify(&dir).unwrap();
        assert_eq!(album.directory_path, dir);
        assert_eq!(album.title, "The Wall");
        assert_eq!(album.artist, "Pink Floyd");
        assert_eq!(album.year, 1979);
        assert_eq!(album.cover_art_path, Some(dir.join("cover.jpg")));
        assert_eq!(
            album.audio_files,
            vec![
                dir.join("01 - In The Flesh.FLAC"),
                dir.join("02 - Another Brick.flac"),
            ]
        );
    }

    #[test]
    fn test_directory_with_subdirectory_is_not_an_album() {
        let root = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let dir = root.path().join("Album");
        fs::create_dir_all(dir.join("Scans")).unwrap();
        touch(&dir.join("01.mp3"));

        let classifier = classifier(&temp);
        assert!(!classifier.is_candidate(&dir));
        assert!(classifier.classify(&dir).is_none());
    }

    #[test]
    fn test_hidden_audio_does_not_qualify() {
        let root = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        touch(&root.path().join("._01.flac"));
        touch(&root.path().join(".02.mp3"));
        touch(&root.path().join("notes.txt"));

        assert!(classifier(&temp).classify(root.path()).is_none());
    }

    #[test]
    fn test_missing_directory_is_not_an_album() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        assert!(classifier(&temp).classify(&missing).is_none());
    }

    #[test]
    fn test_album_without_cover() {
        let root = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let dir = root.path().join("music").join("Loose Tracks");
        fs::create_dir_all(&dir).unwrap();
        touch(&dir.join("a.ogg"));

        let album = classifier(&temp).classify(&dir).unwrap();
        assert_eq!(album.title, "Loose Tracks");
        assert_eq!(album.artist, "");
        assert_eq!(album.year, 0);
        assert_eq!(album.cover_art_path, None);
        assert_eq!(album.audio_files, vec![dir.join("a.ogg")]);
    }
}
