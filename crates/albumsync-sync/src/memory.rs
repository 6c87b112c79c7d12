//! In-memory photo service
//!
//! A [`PhotoService`] that keeps albums and photos in process. It mirrors the
//! behaviour of a real photo host closely enough to exercise the sync engine:
//! an album cannot be empty, so it is created by the upload that provides its
//! first photo and disappears when its last photo is deleted. Failures can be
//! injected per title.

use albumsync_types::{
    AlbumId, Error, Operation, PhotoId, PhotoService, RemoteEntry, Result, UploadOutcome,
    UploadRequest,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

/// A minimal JPEG, handy as fixture content
pub const SMALL_JPG: &[u8] = b"\xff\xd8\xff\xdb\x00C\x00\x03\x02\x02\x02\x02\x02\x03\x02\x02\x02\x03\x03\x03\x03\x04\x06\x04\x04\x04\x04\x04\x08\x06\x06\x05\x06\t\x08\n\n\t\x08\t\t\n\x0c\x0f\x0c\n\x0b\x0e\x0b\t\t\r\x11\r\x0e\x0f\x10\x10\x11\x10\n\x0c\x12\x13\x12\x10\x13\x0f\x10\x10\x10\xff\xc9\x00\x0b\x08\x00\x01\x00\x01\x01\x01\x11\x00\xff\xcc\x00\x06\x00\x10\x10\x05\xff\xda\x00\x08\x01\x01\x00\x00?\x00\xd2\xcf \xff\xd9";

/// A photo stored by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// Title
    pub title: String,
    /// Tags in the order they were attached
    pub tags: Vec<String>,
    /// Content
    pub content: Vec<u8>,
}

/// One recorded upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    /// Title of the uploaded photo
    pub title: String,
    /// Tags sent with the upload
    pub tags: Vec<String>,
    /// Album identifier the caller supplied
    pub album_id: Option<AlbumId>,
}

#[derive(Debug, Default)]
struct Album {
    name: String,
    photos: Vec<PhotoId>,
}

#[derive(Debug, Default)]
struct State {
    albums: BTreeMap<AlbumId, Album>,
    photos: BTreeMap<PhotoId, StoredPhoto>,
    next_id: u64,
    fail_uploads: HashSet<String>,
    fail_downloads: HashSet<String>,
    reject_uploads: HashSet<String>,
    uploads: Vec<UploadRecord>,
    operations: Vec<(Operation, String)>,
    downloads: u64,
    deletes: u64,
    albums_created: u64,
}

impl State {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn create_album(&mut self, name: &str, cover: PhotoId) -> AlbumId {
        let album_id = format!("album-{}", self.allocate_id());
        self.albums.insert(
            album_id.clone(),
            Album {
                name: name.to_string(),
                photos: vec![cover],
            },
        );
        self.albums_created += 1;
        album_id
    }
}

/// In-process photo service with failure injection and call counters
#[derive(Debug, Default)]
pub struct MemoryPhotoService {
    state: Mutex<State>,
}

impl MemoryPhotoService {
    /// Create an empty service
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads of this title fail with a network error
    pub async fn fail_uploads_of(&self, title: impl Into<String>) {
        self.state.lock().await.fail_uploads.insert(title.into());
    }

    /// Downloads of this title fail: no original resolution is available
    pub async fn fail_downloads_of(&self, title: impl Into<String>) {
        self.state.lock().await.fail_downloads.insert(title.into());
    }

    /// Uploads of this title are refused as an unsupported file type
    pub async fn reject_uploads_of(&self, title: impl Into<String>) {
        self.state.lock().await.reject_uploads.insert(title.into());
    }

    /// Create an album holding the given `(title, content, tags)` photos
    pub async fn seed_album(
        &self,
        name: &str,
        photos: Vec<(&str, Vec<u8>, Vec<String>)>,
    ) -> AlbumId {
        let mut state = self.state.lock().await;
        let mut ids = Vec::with_capacity(photos.len());
        for (title, content, tags) in photos {
            let photo_id = state.allocate_id();
            state.photos.insert(
                photo_id.clone(),
                StoredPhoto {
                    title: title.to_string(),
                    tags,
                    content,
                },
            );
            ids.push(photo_id);
        }

        let album_id = format!("album-{}", state.allocate_id());
        state.albums.insert(
            album_id.clone(),
            Album {
                name: name.to_string(),
                photos: ids,
            },
        );
        album_id
    }

    /// Album listing, without going through the trait
    pub async fn list_album_now(&self, album_id: &str) -> Vec<RemoteEntry> {
        self.list_album(album_id).await.unwrap_or_default()
    }

    /// Photos of the first album with this name, keyed by title
    pub async fn album_contents(&self, name: &str) -> BTreeMap<String, StoredPhoto> {
        let state = self.state.lock().await;
        state
            .albums
            .values()
            .find(|album| album.name == name)
            .map(|album| {
                album
                    .photos
                    .iter()
                    .filter_map(|id| state.photos.get(id))
                    .map(|photo| (photo.title.clone(), photo.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every upload call, in order
    pub async fn uploads(&self) -> Vec<UploadRecord> {
        self.state.lock().await.uploads.clone()
    }

    /// Every upload, download and delete call as `(operation, title)`, in call order
    pub async fn operations(&self) -> Vec<(Operation, String)> {
        self.state.lock().await.operations.clone()
    }

    /// Number of upload calls
    pub async fn upload_count(&self) -> usize {
        self.state.lock().await.uploads.len()
    }

    /// Number of download calls
    pub async fn download_count(&self) -> u64 {
        self.state.lock().await.downloads
    }

    /// Number of delete calls
    pub async fn delete_count(&self) -> u64 {
        self.state.lock().await.deletes
    }

    /// Number of albums created by uploads
    pub async fn albums_created(&self) -> u64 {
        self.state.lock().await.albums_created
    }
}

#[async_trait]
impl PhotoService for MemoryPhotoService {
    async fn find_album(&self, name: &str) -> Result<Option<AlbumId>> {
        let state = self.state.lock().await;
        Ok(state
            .albums
            .iter()
            .find(|(_, album)| album.name == name)
            .map(|(id, _)| id.clone()))
    }

    async fn list_album(&self, album_id: &str) -> Result<Vec<RemoteEntry>> {
        let state = self.state.lock().await;
        let album = state
            .albums
            .get(album_id)
            .ok_or_else(|| Error::protocol(format!("Photoset \"{}\" not found", album_id)))?;

        Ok(album
            .photos
            .iter()
            .filter_map(|id| {
                state
                    .photos
                    .get(id)
                    .map(|photo| RemoteEntry::new(&photo.title, id, photo.tags.clone()))
            })
            .collect())
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome> {
        let mut state = self.state.lock().await;
        state.uploads.push(UploadRecord {
            title: request.title.clone(),
            tags: request.tags.clone(),
            album_id: request.album_id.clone(),
        });
        state
            .operations
            .push((Operation::Upload, request.title.clone()));

        if state.fail_uploads.contains(&request.title) {
            return Err(Error::network(format!(
                "connection reset while uploading \"{}\"",
                request.title
            )));
        }
        if state.reject_uploads.contains(&request.title) {
            return Ok(UploadOutcome::Rejected {
                reason: "Filetype was not recognised".to_string(),
            });
        }

        let photo_id = state.allocate_id();
        state.photos.insert(
            photo_id.clone(),
            StoredPhoto {
                title: request.title,
                tags: request.tags,
                content: request.content,
            },
        );

        let existing = request
            .album_id
            .filter(|album_id| state.albums.contains_key(album_id));
        let album_id = match existing {
            Some(album_id) => {
                if let Some(album) = state.albums.get_mut(&album_id) {
                    album.photos.push(photo_id.clone());
                }
                album_id
            }
            None => {
                let album_id = state.create_album(&request.album_name, photo_id.clone());
                debug!("Created album {} ({})", request.album_name, album_id);
                album_id
            }
        };

        Ok(UploadOutcome::Uploaded { photo_id, album_id })
    }

    async fn download(&self, photo_id: &str) -> Result<Vec<u8>> {
        let mut state = self.state.lock().await;
        state.downloads += 1;
        let title = state
            .photos
            .get(photo_id)
            .map_or_else(|| photo_id.to_string(), |photo| photo.title.clone());
        state.operations.push((Operation::Download, title));
        let photo = state
            .photos
            .get(photo_id)
            .ok_or_else(|| Error::protocol(format!("Photo \"{}\" not found", photo_id)))?;

        if state.fail_downloads.contains(&photo.title) {
            return Err(Error::NotRetrievable {
                photo_id: photo_id.to_string(),
            });
        }
        Ok(photo.content.clone())
    }

    async fn delete(&self, photo_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.deletes += 1;
        let Some(photo) = state.photos.remove(photo_id) else {
            state
                .operations
                .push((Operation::DeleteRemote, photo_id.to_string()));
            return Err(Error::protocol(format!("Photo \"{}\" not found", photo_id)));
        };
        state.operations.push((Operation::DeleteRemote, photo.title));

        for album in state.albums.values_mut() {
            album.photos.retain(|id| id != photo_id);
        }
        state.albums.retain(|_, album| !album.photos.is_empty());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, album_id: Option<AlbumId>) -> UploadRequest {
        UploadRequest {
            content: SMALL_JPG.to_vec(),
            title: title.to_string(),
            tags: vec!["tag1".to_string()],
            album_name: "albumname".to_string(),
            album_id,
        }
    }

    #[tokio::test]
    async fn test_upload_creates_album_once() {
        let service = MemoryPhotoService::new();
        assert_eq!(service.find_album("albumname").await.unwrap(), None);

        let first = service.upload(request("a.jpg", None)).await.unwrap();
        let UploadOutcome::Uploaded { album_id, .. } = first else {
            panic!("expected upload");
        };
        service
            .upload(request("b.jpg", Some(album_id.clone())))
            .await
            .unwrap();

        assert_eq!(service.albums_created().await, 1);
        assert_eq!(
            service.find_album("albumname").await.unwrap(),
            Some(album_id.clone())
        );
        assert_eq!(service.list_album(&album_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_album_disappears_when_emptied() {
        let service = MemoryPhotoService::new();
        let album_id = service
            .seed_album("albumname", vec![("a.jpg", SMALL_JPG.to_vec(), vec![])])
            .await;
        let photo_id = service.list_album_now(&album_id).await[0].photo_id.clone();

        service.delete(&photo_id).await.unwrap();

        assert_eq!(service.find_album("albumname").await.unwrap(), None);
        assert!(service.list_album(&album_id).await.is_err());
        assert!(service.delete(&photo_id).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_to_vanished_album_recreates_it() {
        let service = MemoryPhotoService::new();
        let outcome = service
            .upload(request("a.jpg", Some("album-404".to_string())))
            .await
            .unwrap();

        match outcome {
            UploadOutcome::Uploaded { album_id, .. } => assert_ne!(album_id, "album-404"),
            UploadOutcome::Rejected { .. } => panic!("expected upload"),
        }
    }

    #[tokio::test]
    async fn test_operations_are_logged_in_call_order() {
        let service = MemoryPhotoService::new();
        let album_id = service
            .seed_album("albumname", vec![("old.jpg", SMALL_JPG.to_vec(), vec![])])
            .await;
        let old_id = service.list_album_now(&album_id).await[0].photo_id.clone();

        service.download(&old_id).await.unwrap();
        service.delete(&old_id).await.unwrap();
        service.upload(request("new.jpg", None)).await.unwrap();

        assert_eq!(
            service.operations().await,
            vec![
                (Operation::Download, "old.jpg".to_string()),
                (Operation::DeleteRemote, "old.jpg".to_string()),
                (Operation::Upload, "new.jpg".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let service = MemoryPhotoService::new();
        service.fail_uploads_of("bad.jpg").await;
        service.reject_uploads_of("movie.jpg").await;

        let error = service.upload(request("bad.jpg", None)).await.unwrap_err();
        assert!(error.is_recoverable());
        assert!(matches!(
            service.upload(request("movie.jpg", None)).await.unwrap(),
            UploadOutcome::Rejected { .. }
        ));
        assert_eq!(service.upload_count().await, 2);
        assert_eq!(service.albums_created().await, 0);

        let album_id = service
            .seed_album("other", vec![("gone.jpg", SMALL_JPG.to_vec(), vec![])])
            .await;
        service.fail_downloads_of("gone.jpg").await;
        let photo_id = service.list_album_now(&album_id).await[0].photo_id.clone();
        assert!(matches!(
            service.download(&photo_id).await.unwrap_err(),
            Error::NotRetrievable { .. }
        ));
    }
}
