//! Collection loaders for both sides of a sync

use crate::item::{LocalItem, RemoteItem};
use albumsync_types::{Error, PhotoService, Result};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

/// List the files of a local directory, sorted by name.
///
/// Subdirectories and other non-file entries are left out. A missing
/// directory is reported as [`Error::PathNotFound`].
pub async fn load_local(directory: &Path) -> Result<Vec<LocalItem>> {
    let mut entries = match fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::PathNotFound {
                path: directory.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(Error::Io {
                message: format!(
                    "Failed to read directory '{}': {}",
                    directory.display(),
                    e
                ),
            });
        }
    };

    let mut titles = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| Error::Io {
        message: format!("Failed to read directory entry: {}", e),
    })? {
        // Follows symlinks, so a link to a file counts as a file.
        let is_file = fs::metadata(entry.path())
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);
        if !is_file {
            debug!("Skipping non-file entry: {}", entry.path().display());
            continue;
        }

        match entry.file_name().into_string() {
            Ok(title) => titles.push(title),
            Err(name) => warn!("Skipping non UTF-8 file name: {:?}", name),
        }
    }

    titles.sort();
    info!("Local files: {:?}", titles);

    Ok(titles
        .into_iter()
        .map(|title| LocalItem::new(title, directory))
        .collect())
}

/// List the photos of a remote album.
///
/// An album that does not exist yet has no photos. When `tag` is given, only
/// photos carrying that exact tag are kept.
pub async fn load_remote(
    service: &dyn PhotoService,
    album_id: Option<&str>,
    tag: Option<&str>,
) -> Result<Vec<RemoteItem>> {
    let Some(album_id) = album_id else {
        debug!("No album yet, remote listing is empty");
        return Ok(Vec::new());
    };

    let items: Vec<RemoteItem> = service
        .list_album(album_id)
        .await?
        .into_iter()
        .filter(|entry| tag.map_or(true, |tag| entry.tags.iter().any(|t| t == tag)))
        .map(RemoteItem::from)
        .collect();

    info!(
        "Remote photos: {:?}",
        items.iter().map(RemoteItem::title).collect::<Vec<_>>()
    );
    Ok(items)
}
