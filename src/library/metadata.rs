//! Album metadata from directory naming conventions
//!
//! The album directory name gives the title (and optionally the year), the
//! parent directory gives the artist. Tags inside audio files are never
//! consulted here.

use std::path::Path;

/// Parent directory names that are library roots, not artists
const GENERIC_PARENT_NAMES: &[&str] = &["Music", "music", "Albums", "albums"];

/// Metadata derived from an album directory path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlbumMetadata {
    pub title: String,
    pub artist: String,
    /// 0 if not available
    pub year: i32,
}

/// Extract title, artist and year from an album directory path
///
/// Recognized layout: `<artist>/(<YYYY>) <title>`. Both the year prefix and
/// the artist level are optional.
pub fn extract_metadata(directory_path: &Path) -> AlbumMetadata {
    let leaf_name = directory_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parent_name = directory_path
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (title, year) = match parse_year_prefix(&leaf_name) {
        Some((year, rest)) => (rest.to_string(), year),
        None => (leaf_name, 0),
    };

    let artist = if GENERIC_PARENT_NAMES.contains(&parent_name.as_str()) {
        String::new()
    } else {
        parent_name
    };

    AlbumMetadata {
        title,
        artist,
        year,
    }
}

/// Parse `"(YYYY) <rest>"` into the year and the remainder
fn parse_year_prefix(name: &str) -> Option<(i32, &str)> {
    let inner = name.strip_prefix('(')?;
    let digits = inner.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let after = inner[4..].strip_prefix(')')?;
    let rest = after.trim_start();
    if rest.len() == after.len() || rest.is_empty() {
        return None;
    }

    Some((digits.parse().ok()?, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_title_and_artist() {
        let meta = extract_metadata(Path::new("/music/Pink Floyd/(1979) The Wall"));
        assert_eq!(meta.title, "The Wall");
        assert_eq!(meta.year, 1979);
        assert_eq!(meta.artist, "Pink Floyd");
    }

    #[test]
    fn test_generic_parent_is_not_an_artist() {
        for root in ["Music", "music", "Albums", "albums"] {
            let meta = extract_metadata(&Path::new("/").join(root).join("SomeAlbum"));
            assert_eq!(meta.artist, "", "parent {root}");
            assert_eq!(meta.title, "SomeAlbum");
            assert_eq!(meta.year, 0);
        }
    }

    #[test]
    fn test_generic_parent_check_is_case_sensitive() {
        let meta = extract_metadata(Path::new("/MUSIC/SomeAlbum"));
        assert_eq!(meta.artist, "MUSIC");
    }

    #[test]
    fn test_title_without_year_is_verbatim() {
        let meta = extract_metadata(Path::new("/lib/Artist/Wish You Were Here (1975)"));
        assert_eq!(meta.title, "Wish You Were Here (1975)");
        assert_eq!(meta.year, 0);
    }

    #[test]
    fn test_malformed_year_prefixes() {
        assert_eq!(parse_year_prefix("(1979)The Wall"), None);
        assert_eq!(parse_year_prefix("(79) The Wall"), None);
        assert_eq!(parse_year_prefix("(19a9) The Wall"), None);
        assert_eq!(parse_year_prefix("[1979] The Wall"), None);
        assert_eq!(parse_year_prefix("(1979) "), None);
        assert_eq!(parse_year_prefix("(1979)   Animals"), Some((1979, "Animals")));
    }

    #[test]
    fn test_path_without_leaf_name() {
        let meta = extract_metadata(Path::new("/"));
        assert_eq!(meta.title, "");
        assert_eq!(meta.artist, "");
    }
}
