//! Album catalog cache
//!
//! Persists the catalog of the last scan together with its root directory so
//! the next startup can show albums before a rescan finishes.
//!
//! Record layout, all integers in native byte order:
//!
//! ```text
//! version:u32 = 1
//! root_path: len:u32, bytes
//! album_count:u32
//! album_count times:
//!   directory_path, title, artist: len:u32, bytes
//!   year: i32
//!   cover_art_path: len:u32, bytes (empty = no cover)
//!   file_count:u32
//!   file_count times: audio_file: len:u32, bytes
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::album::Album;

/// Current cache format version
pub const CACHE_VERSION: u32 = 1;

/// Default cache file name
pub const CACHE_FILE_NAME: &str = "album-cache.dat";

/// Upper bound on speculative preallocation from untrusted counts
const MAX_PREALLOC: usize = 1024;

/// Cache operation errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cache file is truncated")]
    Truncated,

    #[error("Unsupported cache version {0}")]
    UnsupportedVersion(u32),

    #[error("Cache was built for {cached:?}, not {requested:?}")]
    RootMismatch { cached: PathBuf, requested: PathBuf },

    #[error("Path cannot be stored in the cache: {0:?}")]
    InvalidPath(PathBuf),

    #[error("Field too large for the cache format ({0} bytes)")]
    TooLarge(usize),
}

/// On-disk catalog cache for one music root
#[derive(Debug, Clone)]
pub struct AlbumCache {
    path: PathBuf,
}

impl AlbumCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Cache file in the per-user cache directory
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("org", "album-shelf", "AlbumShelf")
            .map(|dirs| dirs.cache_dir().join(CACHE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(".cache").join(CACHE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file a save is staged in: the cache path with `.tmp` appended
    fn staging_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }

    /// Load the cached catalog for `root`
    ///
    /// Any problem (missing file, corruption, version or root mismatch)
    /// yields an empty catalog.
    pub fn load(&self, root: &Path) -> Vec<Album> {
        match self.try_load(root) {
            Ok(albums) => {
                info!("Loaded {} albums from cache {:?}", albums.len(), self.path);
                albums
            }
            Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No album cache at {:?}", self.path);
                Vec::new()
            }
            Err(e) => {
                warn!("Ignoring album cache {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Load the cached catalog for `root`, reporting why it is unusable
    pub fn try_load(&self, root: &Path) -> Result<Vec<Album>, CacheError> {
        let file = File::open(&self.path)?;
        read_catalog(&mut BufReader::new(file), root)
    }

    /// Replace the cache with `albums` scanned from `root`
    ///
    /// The record is written to a sibling temp file and renamed over the
    /// cache, so a failed save keeps the previous cache.
    pub fn save(&self, root: &Path, albums: &[Album]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.staging_path();
        let result = (|| {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            write_catalog(&mut writer, root, albums)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok::<_, CacheError>(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &self.path)?;
        debug!("Saved {} albums to cache {:?}", albums.len(), self.path);
        Ok(())
    }
}

fn write_catalog<W: Write>(w: &mut W, root: &Path, albums: &[Album]) -> Result<(), CacheError> {
    write_u32(w, CACHE_VERSION)?;
    write_path(w, root)?;
    write_len(w, albums.len())?;

    for album in albums {
        write_path(w, &album.directory_path)?;
        write_bytes(w, album.title.as_bytes())?;
        write_bytes(w, album.artist.as_bytes())?;
        w.write_all(&album.year.to_ne_bytes())?;
        match &album.cover_art_path {
            Some(path) => write_path(w, path)?,
            None => write_bytes(w, &[])?,
        }

        write_len(w, album.audio_files.len())?;
        for file in &album.audio_files {
            write_path(w, file)?;
        }
    }

    Ok(())
}

fn read_catalog<R: Read>(r: &mut R, root: &Path) -> Result<Vec<Album>, CacheError> {
    let version = read_u32(r)?;
    if version != CACHE_VERSION {
        return Err(CacheError::UnsupportedVersion(version));
    }

    let cached_root = read_path(r)?;
    if path_bytes(&cached_root)? != path_bytes(root)? {
        return Err(CacheError::RootMismatch {
            cached: cached_root,
            requested: root.to_path_buf(),
        });
    }

    let album_count = read_u32(r)? as usize;
    let mut albums = Vec::with_capacity(album_count.min(MAX_PREALLOC));

    for _ in 0..album_count {
        let directory_path = read_path(r)?;
        let title = read_string(r)?;
        let artist = read_string(r)?;
        let year = read_i32(r)?;
        let cover = read_path(r)?;
        let cover_art_path = (!cover.as_os_str().is_empty()).then_some(cover);

        let file_count = read_u32(r)? as usize;
        let mut audio_files = Vec::with_capacity(file_count.min(MAX_PREALLOC));
        for _ in 0..file_count {
            audio_files.push(read_path(r)?);
        }

        albums.push(Album {
            directory_path,
            title,
            artist,
            year,
            cover_art_path,
            audio_files,
        });
    }

    Ok(albums)
}

fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<(), CacheError> {
    w.write_all(&value.to_ne_bytes())?;
    Ok(())
}

fn write_len<W: Write>(w: &mut W, len: usize) -> Result<(), CacheError> {
    let len = u32::try_from(len).map_err(|_| CacheError::TooLarge(len))?;
    write_u32(w, len)
}

fn write_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), CacheError> {
    write_len(w, bytes.len())?;
    w.write_all(bytes)?;
    Ok(())
}

fn write_path<W: Write>(w: &mut W, path: &Path) -> Result<(), CacheError> {
    write_bytes(w, &path_bytes(path)?)
}

fn read_array<R: Read, const N: usize>(r: &mut R) -> Result<[u8; N], CacheError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(map_eof)?;
    Ok(buf)
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32, CacheError> {
    Ok(u32::from_ne_bytes(read_array(r)?))
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32, CacheError> {
    Ok(i32::from_ne_bytes(read_array(r)?))
}

/// Length-prefixed bytes, never allocating more than the input holds
fn read_bytes<R: Read>(r: &mut R) -> Result<Vec<u8>, CacheError> {
    let len = read_u32(r)? as usize;
    let mut bytes = Vec::with_capacity(len.min(64 * 1024));
    r.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(CacheError::Truncated);
    }
    Ok(bytes)
}

fn read_string<R: Read>(r: &mut R) -> Result<String, CacheError> {
    let bytes = read_bytes(r)?;
    Ok(String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

fn read_path<R: Read>(r: &mut R) -> Result<PathBuf, CacheError> {
    path_from_bytes(read_bytes(r)?)
}

fn map_eof(e: io::Error) -> CacheError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        CacheError::Truncated
    } else {
        CacheError::Io(e)
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Result<Vec<u8>, CacheError> {
    use std::os::unix::ffi::OsStrExt;
    Ok(path.as_os_str().as_bytes().to_vec())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Result<Vec<u8>, CacheError> {
    path.to_str()
        .map(|s| s.as_bytes().to_vec())
        .ok_or_else(|| CacheError::InvalidPath(path.to_path_buf()))
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> Result<PathBuf, CacheError> {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> Result<PathBuf, CacheError> {
    String::from_utf8(bytes).map(PathBuf::from).map_err(|e| {
        let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
        CacheError::InvalidPath(PathBuf::from(lossy))
    })
}
