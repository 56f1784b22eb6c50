//! album-shelf - scan a music directory and list its albums

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use album_shelf::{AlbumShelf, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let query = std::env::args().nth(1).unwrap_or_default();

    let mut shelf = AlbumShelf::open(Settings::load());
    tracing::info!(
        "Loaded {} cached albums for {:?}",
        shelf.albums().len(),
        shelf.music_directory()
    );

    if let Some(receiver) = shelf.refresh() {
        let albums = receiver.await.context("Scan ended without a result")?;
        if shelf.apply_scan(albums) {
            tracing::info!("Catalog updated");
        }
        let stats = shelf.scan_handle().stats();
        tracing::info!(
            "Scanned {} directories, {} albums",
            stats.directories,
            stats.albums
        );
    }

    for album in shelf.filtered(&query) {
        let year = if album.year > 0 {
            format!(" ({})", album.year)
        } else {
            String::new()
        };
        let cover = if album.has_cover_art() { " [cover]" } else { "" };
        println!(
            "{} - {}{}{}  {} tracks",
            album.display_artist(),
            album.display_title(),
            year,
            cover,
            album.audio_files.len()
        );
    }

    Ok(())
}
