//! Local and remote photo items
//!
//! Both sides of a sync expose the same capability set through [`PhotoItem`]:
//! a title used for matching, a content checksum, a one-directional transfer
//! and a delete from the item's origin. Every operation honours the dry-run
//! flag of the [`SyncContext`] and narrates identically either way.

use crate::checksum;
use crate::content_type;
use crate::context::SyncContext;
use crate::progress::StatusEvent;
use albumsync_types::{
    Error, Operation, PhotoId, RemoteEntry, Result, UploadOutcome, UploadRequest,
};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::debug;

/// Terminal outcome of a transfer that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The content moved (or would have, in a dry run)
    Transferred,
    /// The content was not accepted; narrated, not an error
    Skipped,
}

/// Capabilities shared by local and remote items
#[async_trait]
pub trait PhotoItem: fmt::Debug + Send + Sync {
    /// Operation a transfer of this item performs
    const TRANSFER: Operation;
    /// Operation a delete of this item performs
    const DELETE: Operation;

    /// Matching key; never touches the filesystem or the network
    fn identity(&self) -> &str;

    /// Hex content digest, empty when none is known
    async fn checksum(&self) -> Result<String>;

    /// Move the content to the other side
    async fn transfer(&self, ctx: &SyncContext) -> Result<TransferOutcome>;

    /// Remove the item from its origin
    async fn delete(&self, ctx: &SyncContext) -> Result<()>;
}

/// A file in the local directory
#[derive(Debug, Clone)]
pub struct LocalItem {
    title: String,
    directory: PathBuf,
    checksum: OnceCell<String>,
}

impl LocalItem {
    /// Create an item for `directory/title`
    pub fn new(title: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            directory: directory.into(),
            checksum: OnceCell::new(),
        }
    }

    /// File name
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Directory the file lives in
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full path of the file
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.title)
    }

    /// Image type of the file judged by its leading bytes, `None` for anything else
    pub async fn image_type(&self) -> Result<Option<&'static str>> {
        content_type::sniff_file(&self.path()).await
    }

    async fn upload_tags(&self, ctx: &SyncContext) -> Result<Vec<String>> {
        let mut tags = Vec::with_capacity(2);
        if let Some(tag) = ctx.tag() {
            tags.push(tag.to_string());
        }
        if ctx.checksum() {
            tags.push(checksum::encode(&self.checksum().await?));
        }
        Ok(tags)
    }

    async fn announce_album_creation(&self, ctx: &SyncContext) {
        let mut slot = ctx.album().lock().await;
        if slot.id.is_none() && !slot.announced {
            slot.announced = true;
            ctx.reporter().narrate(StatusEvent::CreatingAlbum {
                album: ctx.album_name().to_string(),
            });
        }
    }
}

#[async_trait]
impl PhotoItem for LocalItem {
    const TRANSFER: Operation = Operation::Upload;
    const DELETE: Operation = Operation::DeleteLocal;

    fn identity(&self) -> &str {
        &self.title
    }

    async fn checksum(&self) -> Result<String> {
        let path = self.path();
        let value = self
            .checksum
            .get_or_try_init(|| checksum::file_checksum(&path))
            .await?;
        debug!("Calculated checksum for photo \"{}\": {}", self.title, value);
        Ok(value.clone())
    }

    async fn transfer(&self, ctx: &SyncContext) -> Result<TransferOutcome> {
        let path = self.path();
        let Some(mime) = self.image_type().await? else {
            ctx.reporter()
                .narrate(StatusEvent::SkippingNonImage { path });
            return Ok(TransferOutcome::Skipped);
        };
        debug!("Content type of {}: {}", path.display(), mime);

        ctx.reporter()
            .narrate(StatusEvent::Uploading { path: path.clone() });
        if ctx.dry_run() {
            self.announce_album_creation(ctx).await;
            return Ok(TransferOutcome::Transferred);
        }

        let content = fs::read(&path).await.map_err(|e| Error::Io {
            message: format!("Failed to read '{}': {}", path.display(), e),
        })?;
        let tags = self.upload_tags(ctx).await?;

        self.announce_album_creation(ctx).await;
        let mut guard = Some(ctx.album().lock().await);
        let known = guard.as_ref().and_then(|slot| slot.id.clone());
        // Until an upload lands in a known album, uploads go one at a time so
        // that a vanished album is recreated once.
        if guard.as_ref().is_some_and(|slot| slot.confirmed) {
            guard = None;
        }

        debug!("Uploading {} to album_id {:?}", path.display(), known);
        let outcome = ctx
            .service()
            .upload(UploadRequest {
                content,
                title: self.title.clone(),
                tags,
                album_name: ctx.album_name().to_string(),
                album_id: known.clone(),
            })
            .await;

        match outcome {
            Ok(UploadOutcome::Uploaded { photo_id, album_id }) => {
                debug!("Uploaded photo ID: {}", photo_id);
                if known.as_ref().is_some_and(|known| *known != album_id) {
                    debug!("Album ID {:?} is gone, now {}", known, album_id);
                }
                match guard.as_mut() {
                    Some(slot) => slot.confirm(album_id),
                    None if known.as_deref() != Some(album_id.as_str()) => {
                        ctx.album().lock().await.confirm(album_id);
                    }
                    None => {}
                }
                Ok(TransferOutcome::Transferred)
            }
            Ok(UploadOutcome::Rejected { reason }) => {
                if let Some(slot) = guard.as_mut() {
                    slot.announced = false;
                }
                ctx.reporter()
                    .narrate(StatusEvent::UploadRejected { path, reason });
                Ok(TransferOutcome::Skipped)
            }
            Err(error) => {
                if let Some(slot) = guard.as_mut() {
                    slot.announced = false;
                }
                Err(error)
            }
        }
    }

    async fn delete(&self, ctx: &SyncContext) -> Result<()> {
        let path = self.path();
        ctx.reporter()
            .narrate(StatusEvent::DeletingLocal { path: path.clone() });
        if ctx.dry_run() {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| Error::Io {
            message: format!("Failed to delete '{}': {}", path.display(), e),
        })
    }
}

/// A photo in the remote album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    title: String,
    photo_id: PhotoId,
    tags: Vec<String>,
}

impl RemoteItem {
    /// Create an item from its listing fields
    pub fn new(
        title: impl Into<String>,
        photo_id: impl Into<PhotoId>,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            photo_id: photo_id.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Remote title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Provider-assigned identifier
    pub fn photo_id(&self) -> &str {
        &self.photo_id
    }

    /// Tags attached to the photo
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Path the download lands at, refusing titles that would escape the directory
    fn local_path(&self, directory: &Path) -> Result<PathBuf> {
        let name = Path::new(&self.title);
        if self.title.is_empty() || name.file_name() != Some(name.as_os_str()) {
            return Err(Error::other(format!(
                "Refusing to download \"{}\": title is not a plain file name",
                self.title
            )));
        }
        Ok(directory.join(name))
    }
}

impl From<RemoteEntry> for RemoteItem {
    fn from(entry: RemoteEntry) -> Self {
        Self {
            title: entry.title,
            photo_id: entry.photo_id,
            tags: entry.tags,
        }
    }
}

#[async_trait]
impl PhotoItem for RemoteItem {
    const TRANSFER: Operation = Operation::Download;
    const DELETE: Operation = Operation::DeleteRemote;

    fn identity(&self) -> &str {
        &self.title
    }

    async fn checksum(&self) -> Result<String> {
        let value = checksum::find_in_tags(&self.tags);
        debug!("Checksum (from tags) for \"{}\": {}", self.title, value);
        Ok(value)
    }

    async fn transfer(&self, ctx: &SyncContext) -> Result<TransferOutcome> {
        ctx.reporter().narrate(StatusEvent::Downloading {
            title: self.title.clone(),
        });
        let output = self.local_path(ctx.local_dir())?;
        if ctx.dry_run() {
            return Ok(TransferOutcome::Transferred);
        }

        debug!("Downloading to \"{}\"", output.display());
        let content = ctx.service().download(&self.photo_id).await?;
        fs::write(&output, content).await.map_err(|e| Error::Io {
            message: format!("Failed to write '{}': {}", output.display(), e),
        })?;
        Ok(TransferOutcome::Transferred)
    }

    async fn delete(&self, ctx: &SyncContext) -> Result<()> {
        ctx.reporter().narrate(StatusEvent::DeletingRemote {
            title: self.title.clone(),
        });
        if ctx.dry_run() {
            return Ok(());
        }

        ctx.service().delete(&self.photo_id).await?;
        // Deleting the last photo removes the album on the provider side.
        ctx.album().lock().await.confirmed = false;
        Ok(())
    }
}

/// A local and a remote item sharing a title but not a checksum
#[derive(Debug, Clone)]
pub struct MismatchedPair {
    /// Local side
    pub local: LocalItem,
    /// Remote side
    pub remote: RemoteItem,
}
