//! Per-run sync context

use crate::progress::ProgressReporter;
use albumsync_types::{AlbumId, Concurrency, PhotoService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Remote album identifier, assigned lazily by the first successful upload
#[derive(Debug, Default)]
pub struct AlbumSlot {
    /// Known album identifier
    pub id: Option<AlbumId>,
    /// Whether the creation of the album has been narrated
    pub announced: bool,
    /// Whether an upload of this run has landed in `id`
    pub confirmed: bool,
}

impl AlbumSlot {
    /// Record the album an upload landed in
    pub fn confirm(&mut self, album_id: AlbumId) {
        self.id = Some(album_id);
        self.confirmed = true;
    }
}

/// State shared by every item operation of one run
pub struct SyncContext {
    service: Arc<dyn PhotoService>,
    local_dir: PathBuf,
    album_name: String,
    album: Mutex<AlbumSlot>,
    tag: Option<String>,
    checksum: bool,
    dry_run: bool,
    concurrency: Concurrency,
    reporter: ProgressReporter,
}

impl SyncContext {
    /// Create a context for one run
    pub fn new(
        service: Arc<dyn PhotoService>,
        local_dir: impl Into<PathBuf>,
        album_name: impl Into<String>,
        album_id: Option<AlbumId>,
        reporter: ProgressReporter,
    ) -> Self {
        Self {
            service,
            local_dir: local_dir.into(),
            album_name: album_name.into(),
            album: Mutex::new(AlbumSlot {
                id: album_id,
                announced: false,
                confirmed: false,
            }),
            tag: None,
            checksum: false,
            dry_run: false,
            concurrency: Concurrency::default(),
            reporter,
        }
    }

    /// Tag attached to uploads
    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    /// Attach checksum tags to uploads
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    /// Narrate without mutating anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Operations of one batch kept in flight at once
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Remote collaborator
    pub fn service(&self) -> &dyn PhotoService {
        self.service.as_ref()
    }

    /// Local directory downloads land in
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Album name, used when the album has to be created
    pub fn album_name(&self) -> &str {
        &self.album_name
    }

    /// Album slot; hold the guard across an upload that may create the album
    pub fn album(&self) -> &Mutex<AlbumSlot> {
        &self.album
    }

    /// Current album identifier
    pub async fn album_id(&self) -> Option<AlbumId> {
        self.album.lock().await.id.clone()
    }

    /// Tag attached to uploads
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Whether uploads carry a checksum tag
    pub fn checksum(&self) -> bool {
        self.checksum
    }

    /// Whether mutations are suppressed
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Operations of one batch kept in flight at once
    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// Narration channel
    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("local_dir", &self.local_dir)
            .field("album_name", &self.album_name)
            .field("tag", &self.tag)
            .field("checksum", &self.checksum)
            .field("dry_run", &self.dry_run)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
