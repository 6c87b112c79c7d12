//! Fixtures for albumsync end-to-end scenarios
//!
//! Scenarios drive a [`SyncEngine`] against [`MemoryPhotoService`] and a
//! temporary photo directory, then inspect both sides.

#![warn(missing_docs)]
#![warn(clippy::all)]

use albumsync_sync::memory::SMALL_JPG;
use albumsync_sync::{MemoryPhotoService, SyncEngine, SyncOptions, SyncReport, SyncRequest};
use albumsync_types::{AlbumId, PhotoService, RemoteEntry, Result, UploadOutcome, UploadRequest};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Album name used by the scenarios
pub const ALBUM: &str = "albumname";

/// A temporary local photo directory
pub struct PhotoDir {
    temp_dir: TempDir,
}

impl PhotoDir {
    /// Create an empty directory
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Create a directory holding a small JPEG under each name
    pub fn with_photos(names: &[&str]) -> std::io::Result<Self> {
        let dir = Self::new()?;
        for name in names {
            dir.write(name, SMALL_JPG)?;
        }
        Ok(dir)
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of a file in the directory
    pub fn join(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Write a file
    pub fn write(&self, name: &str, content: &[u8]) -> std::io::Result<()> {
        std::fs::write(self.join(name), content)
    }

    /// Read a file
    pub fn read(&self, name: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.join(name))
    }

    /// File names currently in the directory
    pub fn names(&self) -> std::io::Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in std::fs::read_dir(self.path())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }
}

/// `(title, content, tags)` triples holding a small JPEG, for seeding albums
pub fn seeded<'a>(names: &[&'a str]) -> Vec<(&'a str, Vec<u8>, Vec<String>)> {
    names
        .iter()
        .map(|name| (*name, SMALL_JPG.to_vec(), Vec::new()))
        .collect()
}

/// Owned set of names, for comparing against [`PhotoDir::names`]
pub fn name_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// Outcome of one engine run
pub struct RunOutcome {
    /// Result returned by the engine
    pub result: Result<SyncReport>,
    /// Narration lines in emission order
    pub narration: Vec<String>,
}

impl RunOutcome {
    /// Narration lines, sorted so concurrent runs compare deterministically
    pub fn sorted_narration(&self) -> Vec<String> {
        let mut lines = self.narration.clone();
        lines.sort();
        lines
    }
}

/// A [`PhotoService`] that holds every upload for a fixed delay first
///
/// Widens the window in which concurrent uploads overlap.
pub struct DelayedUploads {
    inner: Arc<MemoryPhotoService>,
    delay: Duration,
}

impl DelayedUploads {
    /// Wrap `inner`, sleeping `delay` before each upload
    pub fn new(inner: Arc<MemoryPhotoService>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl PhotoService for DelayedUploads {
    async fn find_album(&self, name: &str) -> Result<Option<AlbumId>> {
        self.inner.find_album(name).await
    }

    async fn list_album(&self, album_id: &str) -> Result<Vec<RemoteEntry>> {
        self.inner.list_album(album_id).await
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome> {
        tokio::time::sleep(self.delay).await;
        self.inner.upload(request).await
    }

    async fn download(&self, photo_id: &str) -> Result<Vec<u8>> {
        self.inner.download(photo_id).await
    }

    async fn delete(&self, photo_id: &str) -> Result<()> {
        self.inner.delete(photo_id).await
    }
}

/// Run one sync of `dir` against [`ALBUM`] and collect its narration
pub async fn run_sync(
    service: &Arc<MemoryPhotoService>,
    dir: &PhotoDir,
    options: SyncOptions,
) -> RunOutcome {
    run_sync_with(service.clone(), dir, options).await
}

/// Like [`run_sync`], for any [`PhotoService`]
pub async fn run_sync_with(
    service: Arc<dyn PhotoService>,
    dir: &PhotoDir,
    options: SyncOptions,
) -> RunOutcome {
    let mut engine = SyncEngine::new(service);
    let mut events = engine.take_event_receiver();

    let request = SyncRequest::new(ALBUM, dir.path()).with_options(options);
    let result = engine.run(request).await;

    let mut narration = Vec::new();
    if let Some(events) = events.as_mut() {
        while let Ok(event) = events.try_recv() {
            if event.is_narration() {
                narration.push(event.to_string());
            }
        }
    }
    RunOutcome { result, narration }
}
