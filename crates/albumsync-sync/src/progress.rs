//! Progress tracking and status narration for sync runs
//!
//! Every transfer, delete and skip decision produces one [`StatusEvent`]. The
//! `Display` of a narration event is the line shown to the user; dry runs emit
//! exactly the same events as real runs.

use albumsync_types::{ItemFailure, Operation, SyncStats};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

/// Phases of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Validating the request
    Initializing,
    /// Listing the local directory and the remote album
    Listing,
    /// Classifying items
    Classifying,
    /// Uploading, downloading and replacing items
    Transferring,
    /// Deleting destination-only items
    Pruning,
    /// Completed without failures
    Completed,
    /// Completed with failures, or aborted
    Failed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Listing => "listing",
            Self::Classifying => "classifying",
            Self::Transferring => "transferring",
            Self::Pruning => "pruning",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Progress information for a sync run
#[derive(Debug, Clone)]
pub struct SyncProgress {
    /// Run identifier
    pub request_id: uuid::Uuid,
    /// Current phase
    pub phase: SyncPhase,
    /// Title of the item currently being processed
    pub current_item: Option<String>,
    /// Counters for the run so far
    pub stats: SyncStats,
    /// Start time of the run
    pub start_time: Instant,
}

impl SyncProgress {
    /// Create a new sync progress
    pub fn new(request_id: uuid::Uuid) -> Self {
        Self {
            request_id,
            phase: SyncPhase::Initializing,
            current_item: None,
            stats: SyncStats::new(),
            start_time: Instant::now(),
        }
    }

    /// Update the current phase
    pub fn set_phase(&mut self, phase: SyncPhase) {
        self.phase = phase;
        debug!("Sync phase changed to: {}", phase);
    }

    /// Get elapsed time
    pub fn elapsed_time(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Status events emitted during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Phase changed
    PhaseChanged(SyncPhase),
    /// A local file is about to be uploaded
    Uploading {
        /// Full path of the local file
        path: PathBuf,
    },
    /// A local file failed the content-type gate
    SkippingNonImage {
        /// Full path of the local file
        path: PathBuf,
    },
    /// The service refused the uploaded content
    UploadRejected {
        /// Full path of the local file
        path: PathBuf,
        /// Reason given by the service
        reason: String,
    },
    /// The album does not exist yet and will be created by the upload
    CreatingAlbum {
        /// Album name
        album: String,
    },
    /// A remote photo is about to be downloaded
    Downloading {
        /// Remote title
        title: String,
    },
    /// A local file is about to be deleted
    DeletingLocal {
        /// Full path of the local file
        path: PathBuf,
    },
    /// A remote photo is about to be deleted
    DeletingRemote {
        /// Remote title
        title: String,
    },
    /// An item operation failed, the batch continues
    Failed(ItemFailure),
    /// The run finished
    Completed(SyncStats),
}

impl StatusEvent {
    /// Whether this event is a user-facing narration line
    pub fn is_narration(&self) -> bool {
        !matches!(self, Self::PhaseChanged(_) | Self::Completed(_))
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseChanged(phase) => write!(f, "Phase: {}", phase),
            Self::Uploading { path } => write!(f, "Uploading: {}", path.display()),
            Self::SkippingNonImage { path } => {
                write!(f, "Skipping non-image: {}", path.display())
            }
            Self::UploadRejected { path, reason } => {
                write!(f, "...failed to upload {}: {}", path.display(), reason)
            }
            Self::CreatingAlbum { album } => {
                write!(f, "Album \"{}\" doesn't exist, creating it", album)
            }
            Self::Downloading { title } => write!(f, "Downloading: \"{}\"", title),
            Self::DeletingLocal { path } => write!(f, "Deleting from local: {}", path.display()),
            Self::DeletingRemote { title } => write!(f, "Deleting from album: {}", title),
            Self::Failed(failure) => write!(f, "Failed to {}", failure),
            Self::Completed(stats) => write!(
                f,
                "Done: {} uploaded, {} downloaded, {} deleted, {} skipped, {} failed",
                stats.uploaded,
                stats.downloaded,
                stats.deletions(),
                stats.skipped,
                stats.failed
            ),
        }
    }
}

/// Progress reporter for sync runs
#[derive(Debug)]
pub struct ProgressReporter {
    progress: Arc<RwLock<SyncProgress>>,
    event_tx: mpsc::UnboundedSender<StatusEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<StatusEvent>>,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(request_id: uuid::Uuid) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let progress = Arc::new(RwLock::new(SyncProgress::new(request_id)));

        Self {
            progress,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Get the current progress
    pub async fn get_progress(&self) -> SyncProgress {
        self.progress.read().await.clone()
    }

    /// Take the event receiver (can only be called once)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<StatusEvent>> {
        self.event_rx.take()
    }

    /// Start tracking a new run, clearing previous counters
    pub async fn reset(&self, request_id: uuid::Uuid) {
        *self.progress.write().await = SyncProgress::new(request_id);
    }

    /// Emit a narration event
    pub fn narrate(&self, event: StatusEvent) {
        debug!("{}", event);
        let _ = self.event_tx.send(event);
    }

    /// Update the current phase
    pub async fn set_phase(&self, phase: SyncPhase) {
        self.progress.write().await.set_phase(phase);
        let _ = self.event_tx.send(StatusEvent::PhaseChanged(phase));
    }

    /// Report an item started
    pub async fn item_started(&self, title: &str) {
        self.progress.write().await.current_item = Some(title.to_string());
    }

    /// Report an operation completed
    pub async fn item_completed(&self, operation: Operation) {
        let mut progress = self.progress.write().await;
        progress.stats.record(operation);
        progress.current_item = None;
    }

    /// Report an item skipped by the content-type gate or the service
    pub async fn item_skipped(&self) {
        let mut progress = self.progress.write().await;
        progress.stats.skipped += 1;
        progress.current_item = None;
    }

    /// Report an item failure
    pub async fn item_failed(&self, failure: ItemFailure) {
        {
            let mut progress = self.progress.write().await;
            progress.stats.failed += 1;
            progress.current_item = None;
        }
        let _ = self.event_tx.send(StatusEvent::Failed(failure));
    }

    /// Report the run finished, returning the final counters
    pub async fn finished(&self) -> SyncStats {
        let stats = {
            let mut progress = self.progress.write().await;
            let phase = if progress.stats.failed == 0 {
                SyncPhase::Completed
            } else {
                SyncPhase::Failed
            };
            progress.set_phase(phase);
            progress.stats.duration = progress.elapsed_time();
            progress.stats.clone()
        };

        info!(
            "Sync finished: {} transfers, {} deletions, {} skipped, {} failed in {:?}",
            stats.transfers(),
            stats.deletions(),
            stats.skipped,
            stats.failed,
            stats.duration
        );

        let _ = self.event_tx.send(StatusEvent::Completed(stats.clone()));
        stats
    }

    /// Report the run aborted before completing
    pub async fn aborted(&self) {
        self.progress.write().await.set_phase(SyncPhase::Failed);
        let _ = self.event_tx.send(StatusEvent::PhaseChanged(SyncPhase::Failed));
    }
}

impl Clone for ProgressReporter {
    fn clone(&self) -> Self {
        Self {
            progress: Arc::clone(&self.progress),
            event_tx: self.event_tx.clone(),
            event_rx: None, // Clone doesn't get the receiver
        }
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:01}s", seconds, duration.subsec_millis() / 100)
    }
}
