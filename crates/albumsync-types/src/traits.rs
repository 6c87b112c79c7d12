//! Core traits for albumsync operations
//!
//! This module defines the seam between the reconciliation core and a remote
//! photo-hosting service. The engine only ever talks to a `dyn PhotoService`,
//! so the HTTP client and the in-memory double are interchangeable.

use crate::{AlbumId, RemoteEntry, Result, UploadOutcome, UploadRequest};
use async_trait::async_trait;

/// A remote photo-hosting service organised into named albums
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Look up an album by name, `None` when no album carries that name
    async fn find_album(&self, name: &str) -> Result<Option<AlbumId>>;

    /// List every photo in an album
    async fn list_album(&self, album_id: &str) -> Result<Vec<RemoteEntry>>;

    /// Upload content and add it to the album.
    ///
    /// When `request.album_id` is `None` the service creates the album named
    /// `request.album_name` with the new photo as its first member.
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome>;

    /// Fetch the full-resolution content of a photo
    async fn download(&self, photo_id: &str) -> Result<Vec<u8>>;

    /// Delete a photo from the service
    async fn delete(&self, photo_id: &str) -> Result<()>;
}
