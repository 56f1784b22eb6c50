//! Cover art resolution
//!
//! Resolution order:
//! 1. Conventional cover filenames in the album directory
//! 2. Any image file in the album directory
//! 3. Picture embedded in the first audio file, extracted to a temp file

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lofty::config::ParseOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::TagType;
use xxhash_rust::xxh3::xxh3_64;

use super::{is_image_file, is_visible_file};

/// Conventional cover filenames, in priority order
pub const COVER_FILENAMES: &[&str] = &[
    // JPG
    "Cover.jpg",
    "Folder.jpg",
    "cover.jpg",
    "folder.jpg",
    "front.jpg",
    "Front.jpg",
    "album.jpg",
    "Album.jpg",
    "artwork.jpg",
    "Artwork.jpg",
    // PNG
    "Cover.png",
    "Folder.png",
    "cover.png",
    "folder.png",
    "front.png",
    "Front.png",
    "album.png",
    "Album.png",
    "artwork.png",
    "Artwork.png",
    // JPEG
    "Cover.jpeg",
    "cover.jpeg",
    "Folder.jpeg",
    "folder.jpeg",
    // Upper-case extensions
    "cover.JPG",
    "COVER.JPG",
    "folder.JPG",
    "FOLDER.JPG",
];

/// Filename prefix of extracted embedded pictures
const EMBEDDED_ART_PREFIX: &str = "album_cover_";

/// Path where the embedded picture of `audio_file` is extracted to
///
/// The name is derived from a hash of the audio path, so repeated
/// extractions for the same file overwrite one temp file. The suffix is
/// always `.jpg`, whatever the picture encoding.
pub fn embedded_art_path(temp_dir: &Path, audio_file: &Path) -> PathBuf {
    let hash = xxh3_64(audio_file.as_os_str().as_encoded_bytes());
    temp_dir.join(format!("{}{:016x}.jpg", EMBEDDED_ART_PREFIX, hash))
}

/// Finds or extracts cover art for album directories
#[derive(Debug, Clone)]
pub struct CoverArtResolver {
    temp_dir: PathBuf,
}

impl Default for CoverArtResolver {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl CoverArtResolver {
    /// Create a resolver that extracts embedded pictures into `temp_dir`
    pub fn new(temp_dir: PathBuf) -> Self {
        Self { temp_dir }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Resolve cover art for `directory`
    ///
    /// `audio_files` must be in album order; only the first one is probed
    /// for an embedded picture. Returns `None` when nothing usable exists.
    pub fn resolve(&self, directory: &Path, audio_files: &[PathBuf]) -> Option<PathBuf> {
        if let Some(path) = find_conventional_cover(directory) {
            return Some(path);
        }

        if let Some(path) = find_any_image(directory) {
            return Some(path);
        }

        let first = audio_files.first()?;
        match self.extract_embedded_art(first) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Failed to extract embedded art from {:?}: {:#}", first, e);
                None
            }
        }
    }

    /// Extract the embedded picture of `audio_file` to the temp directory
    fn extract_embedded_art(&self, audio_file: &Path) -> Result<Option<PathBuf>> {
        let Some(data) = read_embedded_picture(audio_file)? else {
            return Ok(None);
        };

        self.write_embedded_art(audio_file, &data).map(Some)
    }

    /// Write raw picture bytes to the deterministic temp path for `audio_file`
    fn write_embedded_art(&self, audio_file: &Path, data: &[u8]) -> Result<PathBuf> {
        let output_path = embedded_art_path(&self.temp_dir, audio_file);

        fs::create_dir_all(&self.temp_dir).context("Failed to create temp art directory")?;
        fs::write(&output_path, data).context("Failed to write embedded art")?;

        tracing::debug!("Extracted embedded art {:?} -> {:?}", audio_file, output_path);
        Ok(output_path)
    }
}

/// Stage 1: conventional names, in order
fn find_conventional_cover(directory: &Path) -> Option<PathBuf> {
    COVER_FILENAMES
        .iter()
        .map(|name| directory.join(name))
        .find(|path| path.is_file())
}

/// Stage 2: first visible image file in directory order
fn find_any_image(directory: &Path) -> Option<PathBuf> {
    let read_dir = match fs::read_dir(directory) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!("Cannot read directory for cover art {:?}: {}", directory, e);
            return None;
        }
    };

    read_dir
        .flatten()
        .filter(is_visible_file)
        .map(|entry| entry.path())
        .find(|path| is_image_file(path))
}

/// Read the first attached picture of a FLAC or MP3 file
///
/// FLAC pictures live in the Vorbis comment block list, MP3 pictures in
/// ID3v2 APIC frames. Other containers are not probed. Audio properties are
/// not parsed, so a tag-only file still yields its picture.
fn read_embedded_picture(audio_file: &Path) -> Result<Option<Vec<u8>>> {
    let tag_type = match audio_file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("flac") => TagType::VorbisComments,
        Some("mp3") => TagType::Id3v2,
        _ => return Ok(None),
    };

    let tagged_file = Probe::open(audio_file)
        .context("Failed to open audio file")?
        .options(ParseOptions::new().read_properties(false))
        .read()
        .context("Failed to read audio file")?;

    let data = tagged_file
        .tag(tag_type)
        .and_then(|tag| tag.pictures().first())
        .map(|picture| picture.data().to_vec())
        .filter(|data| !data.is_empty());

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_cover_filenames_priority() {
        assert_eq!(COVER_FILENAMES[0], "Cover.jpg");
        assert_eq!(COVER_FILENAMES[1], "Folder.jpg");
        assert_eq!(COVER_FILENAMES.last(), Some(&"FOLDER.JPG"));
    }

    #[test]
    fn test_conventional_name_wins_over_other_images() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "aaa.png");
        let folder = touch(dir.path(), "Folder.jpg");

        let resolver = CoverArtResolver::new(dir.path().to_path_buf());
        assert_eq!(resolver.resolve(dir.path(), &[]), Some(folder));
    }

    #[test]
    fn test_png_cover_used_when_no_jpg() {
        let dir = TempDir::new().unwrap();
        let cover = touch(dir.path(), "cover.png");

        let resolver = CoverArtResolver::new(dir.path().to_path_buf());
        assert_eq!(resolver.resolve(dir.path(), &[]), Some(cover));
    }

    #[test]
    fn test_directory_named_like_cover_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Cover.jpg")).unwrap();
        let scan = touch(dir.path(), "scan.webp");

        let resolver = CoverArtResolver::new(dir.path().to_path_buf());
        assert_eq!(resolver.resolve(dir.path(), &[]), Some(scan));
    }

    #[test]
    fn test_any_image_skips_hidden_and_sidecar_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "._booklet.jpg");
        touch(dir.path(), ".thumb.png");
        touch(dir.path(), "notes.txt");

        let resolver = CoverArtResolver::new(dir.path().to_path_buf());
        assert_eq!(resolver.resolve(dir.path(), &[]), None);

        let booklet = touch(dir.path(), "booklet.GIF");
        assert_eq!(resolver.resolve(dir.path(), &[]), Some(booklet));
    }

    #[test]
    fn test_unreadable_audio_falls_through_to_none() {
        let dir = TempDir::new().unwrap();
        let audio = touch(dir.path(), "01.flac");
        let temp = TempDir::new().unwrap();

        let resolver = CoverArtResolver::new(temp.path().to_path_buf());
        assert_eq!(resolver.resolve(dir.path(), &[audio]), None);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    const PICTURE: &[u8] = b"\xFF\xD8\xFF\xE0 embedded front cover";

    /// STREAMINFO followed by a front-cover PICTURE block, no audio frames
    fn write_flac_with_picture(path: &Path, data: &[u8]) {
        let mime = b"image/jpeg";
        let mut picture = Vec::new();
        picture.extend_from_slice(&3u32.to_be_bytes());
        picture.extend_from_slice(&(mime.len() as u32).to_be_bytes());
        picture.extend_from_slice(mime);
        picture.extend_from_slice(&0u32.to_be_bytes());
        picture.extend_from_slice(&[0; 16]);
        picture.extend_from_slice(&(data.len() as u32).to_be_bytes());
        picture.extend_from_slice(data);

        let mut stream_info = [0u8; 34];
        stream_info[..4].copy_from_slice(&[0x10, 0x00, 0x10, 0x00]);
        // 44100 Hz, 2 channels, 16 bits per sample
        stream_info[10..14].copy_from_slice(&[0x0A, 0xC4, 0x42, 0xF0]);

        let mut file = b"fLaC".to_vec();
        file.extend_from_slice(&[0x00, 0x00, 0x00, 34]);
        file.extend_from_slice(&stream_info);
        let len = (picture.len() as u32).to_be_bytes();
        file.extend_from_slice(&[0x80 | 6, len[1], len[2], len[3]]);
        file.extend_from_slice(&picture);

        fs::write(path, file).unwrap();
    }

    /// ID3v2 tag carrying an APIC frame, padded with silence
    fn write_mp3_with_picture(path: &Path, data: &[u8]) {
        use lofty::config::WriteOptions;
        use lofty::id3::v2::Id3v2Tag;
        use lofty::picture::{MimeType, Picture, PictureType};
        use lofty::tag::TagExt;

        let mut tag = Id3v2Tag::new();
        tag.insert_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Jpeg),
            None,
            data.to_vec(),
        ));

        let mut file = Vec::new();
        tag.dump_to(&mut file, WriteOptions::default()).unwrap();
        file.extend_from_slice(&[0; 512]);
        fs::write(path, file).unwrap();
    }

    #[test]
    fn test_extracts_flac_picture() {
        let dir = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let audio = dir.path().join("01.flac");
        write_flac_with_picture(&audio, PICTURE);

        let resolver = CoverArtResolver::new(temp.path().join("art"));
        let expected = embedded_art_path(resolver.temp_dir(), &audio);

        let cover = resolver.resolve(dir.path(), &[audio.clone()]).unwrap();
        assert_eq!(cover, expected);
        assert_eq!(fs::read(&cover).unwrap(), PICTURE);

        let again = resolver.resolve(dir.path(), &[audio]).unwrap();
        assert_eq!(again, cover);
        assert_eq!(fs::read_dir(resolver.temp_dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_extracts_mp3_picture() {
        let dir = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let audio = dir.path().join("01.mp3");
        write_mp3_with_picture(&audio, PICTURE);

        let resolver = CoverArtResolver::new(temp.path().to_path_buf());
        let cover = resolver.resolve(dir.path(), &[audio.clone()]).unwrap();

        assert_eq!(cover, embedded_art_path(temp.path(), &audio));
        assert_eq!(fs::read(&cover).unwrap(), PICTURE);
    }

    #[test]
    fn test_sibling_image_wins_over_embedded_picture() {
        let dir = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let audio = dir.path().join("01.flac");
        write_flac_with_picture(&audio, PICTURE);
        let scan = touch(dir.path(), "scan.png");

        let resolver = CoverArtResolver::new(temp.path().to_path_buf());
        assert_eq!(resolver.resolve(dir.path(), &[audio]), Some(scan));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unsupported_container_is_not_probed() {
        let dir = TempDir::new().unwrap();
        let audio = touch(dir.path(), "01.ogg");
        assert_eq!(read_embedded_picture(&audio).unwrap(), None);
    }

    #[test]
    fn test_embedded_art_path_is_deterministic() {
        let temp = Path::new("/tmp/art");
        let a = embedded_art_path(temp, Path::new("/music/a/01.flac"));
        let b = embedded_art_path(temp, Path::new("/music/a/01.flac"));
        let c = embedded_art_path(temp, Path::new("/music/a/02.flac"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.parent(), Some(temp));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(
            a.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(EMBEDDED_ART_PREFIX)
        );
    }

    #[test]
    fn test_write_embedded_art_overwrites_same_path() {
        let temp = TempDir::new().unwrap();
        let resolver = CoverArtResolver::new(temp.path().join("covers"));
        let audio = Path::new("/music/a/01.mp3");

        let first = resolver.write_embedded_art(audio, b"\x89PNG first").unwrap();
        let second = resolver.write_embedded_art(audio, b"second").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&second).unwrap(), b"second");
        assert_eq!(fs::read_dir(resolver.temp_dir()).unwrap().count(), 1);
    }
}
