//! Main synchronization engine

use crate::{
    checksum,
    context::SyncContext,
    diff::{Classification, DiffEngine},
    item::{PhotoItem, TransferOutcome},
    loader,
    progress::{ProgressReporter, SyncPhase, StatusEvent},
};
use albumsync_types::{
    AlbumId, Concurrency, Direction, Error, ItemFailure, PhotoService, Result, SyncMode,
    SyncStats,
};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Synchronization request
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Remote album name
    pub album: String,
    /// Local directory path
    pub local_dir: PathBuf,
    /// Sync options
    pub options: SyncOptions,
    /// Request ID for tracking
    pub request_id: uuid::Uuid,
}

impl SyncRequest {
    /// Create a new sync request
    pub fn new<P: AsRef<Path>>(album: impl Into<String>, local_dir: P) -> Self {
        Self {
            album: album.into(),
            local_dir: local_dir.as_ref().to_path_buf(),
            options: SyncOptions::default(),
            request_id: uuid::Uuid::new_v4(),
        }
    }

    /// Set sync options
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }
}

/// Synchronization options
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Directions and modifiers
    pub mode: SyncMode,
    /// Tag attached to uploads and used to filter the remote listing
    pub tag: Option<String>,
    /// Narrate without changing anything
    pub dry_run: bool,
    /// Operations of one batch kept in flight at once
    pub concurrency: Concurrency,
}

impl SyncOptions {
    /// Create options for the given mode
    pub fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the user tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Enable or disable dry run
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the batch concurrency
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Check the mode combination and the user tag
    pub fn validate(&self) -> Result<()> {
        self.mode.validate()?;
        if let Some(tag) = &self.tag {
            checksum::validate_user_tag(tag)?;
        }
        Ok(())
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Request ID
    pub request_id: uuid::Uuid,
    /// Album identifier after the run, if the album exists
    pub album_id: Option<AlbumId>,
    /// Operation counters
    pub stats: SyncStats,
    /// Items found only locally
    pub local_only: usize,
    /// Items found only in the album
    pub remote_only: usize,
    /// Items whose checksums differed
    pub mismatched: usize,
    /// Whether the run was a dry run
    pub dry_run: bool,
}

impl SyncReport {
    /// Whether both sides already agreed before the run
    pub fn was_in_sync(&self) -> bool {
        self.local_only == 0 && self.remote_only == 0 && self.mismatched == 0
    }
}

/// Main synchronization engine
pub struct SyncEngine {
    service: Arc<dyn PhotoService>,
    reporter: ProgressReporter,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Create a sync engine talking to `service`
    pub fn new(service: Arc<dyn PhotoService>) -> Self {
        Self {
            service,
            reporter: ProgressReporter::new(uuid::Uuid::new_v4()),
        }
    }

    /// Take the narration receiver (can only be called once)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<StatusEvent>> {
        self.reporter.take_event_receiver()
    }

    /// Progress reporter shared with running operations
    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    /// Execute a full run: list both sides, classify, then transfer and delete
    pub async fn run(&self, request: SyncRequest) -> Result<SyncReport> {
        self.reporter.reset(request.request_id).await;
        info!(
            "Starting sync {} of album \"{}\" with {}",
            request.request_id,
            request.album,
            request.local_dir.display()
        );

        let (ctx, classification) = match self.prepare(&request).await {
            Ok(prepared) => prepared,
            Err(e) => {
                self.reporter.aborted().await;
                return Err(e);
            }
        };

        let stats = sync(&ctx, &classification, request.options.mode).await?;

        Ok(SyncReport {
            request_id: request.request_id,
            album_id: ctx.album_id().await,
            stats,
            local_only: classification.local_only.len(),
            remote_only: classification.remote_only.len(),
            mismatched: classification.mismatched.len(),
            dry_run: request.options.dry_run,
        })
    }

    async fn prepare(&self, request: &SyncRequest) -> Result<(SyncContext, Classification)> {
        let options = &request.options;
        self.reporter.set_phase(SyncPhase::Initializing).await;
        options.validate()?;

        self.reporter.set_phase(SyncPhase::Listing).await;
        let local = loader::load_local(&request.local_dir).await?;
        let album_id = self.service.find_album(&request.album).await?;
        info!("Album \"{}\" has ID {:?}", request.album, album_id);
        let remote =
            loader::load_remote(self.service.as_ref(), album_id.as_deref(), options.tag.as_deref())
                .await?;

        self.reporter.set_phase(SyncPhase::Classifying).await;
        let classification = DiffEngine::new(options.mode.checksum)
            .diff(local, remote)
            .await?;

        let ctx = SyncContext::new(
            Arc::clone(&self.service),
            &request.local_dir,
            &request.album,
            album_id,
            self.reporter.clone(),
        )
        .with_tag(options.tag.clone())
        .with_checksum(options.mode.checksum)
        .with_dry_run(options.dry_run)
        .with_concurrency(options.concurrency);

        Ok((ctx, classification))
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Transfer,
    Delete,
}

/// Apply a classification in the order the mode prescribes.
///
/// Per direction: new content is transferred first, then mismatched content
/// is deleted and transferred again, and pruning comes last. Every item is
/// attempted; failures are collected and returned together as
/// [`Error::Batch`] once all batches have run.
pub async fn sync(
    ctx: &SyncContext,
    classification: &Classification,
    mode: SyncMode,
) -> Result<SyncStats> {
    let mut failures = Vec::new();

    for direction in mode.directions() {
        ctx.reporter().set_phase(SyncPhase::Transferring).await;
        match direction {
            Direction::Push => {
                failures.extend(run_batch(ctx, &classification.local_only, Action::Transfer).await);
                if mode.checksum {
                    let remote = classification.mismatched_remote();
                    failures.extend(run_batch(ctx, &remote, Action::Delete).await);
                    let local = classification.mismatched_local();
                    failures.extend(run_batch(ctx, &local, Action::Transfer).await);
                }
                if mode.prune {
                    ctx.reporter().set_phase(SyncPhase::Pruning).await;
                    failures
                        .extend(run_batch(ctx, &classification.remote_only, Action::Delete).await);
                }
            }
            Direction::Pull => {
                failures
                    .extend(run_batch(ctx, &classification.remote_only, Action::Transfer).await);
                if mode.checksum {
                    let local = classification.mismatched_local();
                    failures.extend(run_batch(ctx, &local, Action::Delete).await);
                    let remote = classification.mismatched_remote();
                    failures.extend(run_batch(ctx, &remote, Action::Transfer).await);
                }
                if mode.prune {
                    ctx.reporter().set_phase(SyncPhase::Pruning).await;
                    failures.extend(run_batch(ctx, &classification.local_only, Action::Delete).await);
                }
            }
        }
    }

    let stats = ctx.reporter().finished().await;
    if failures.is_empty() {
        Ok(stats)
    } else {
        warn!("{} operation(s) failed", failures.len());
        Err(Error::Batch { failures })
    }
}

async fn run_batch<T: PhotoItem>(
    ctx: &SyncContext,
    items: &[T],
    action: Action,
) -> Vec<ItemFailure> {
    let operation = match action {
        Action::Transfer => T::TRANSFER,
        Action::Delete => T::DELETE,
    };

    let mut pending = stream::iter(items)
        .map(|item| async move {
            ctx.reporter().item_started(item.identity()).await;
            let result = match action {
                Action::Transfer => item.transfer(ctx).await,
                Action::Delete => item.delete(ctx).await.map(|()| TransferOutcome::Transferred),
            };
            (item, result)
        })
        .buffer_unordered(ctx.concurrency().get());

    let mut failures = Vec::new();
    while let Some((item, result)) = pending.next().await {
        match result {
            Ok(TransferOutcome::Transferred) => ctx.reporter().item_completed(operation).await,
            Ok(TransferOutcome::Skipped) => ctx.reporter().item_skipped().await,
            Err(e) => {
                let failure = ItemFailure::new(operation, item.identity(), &e);
                warn!("Failed to {}", failure);
                ctx.reporter().item_failed(failure.clone()).await;
                failures.push(failure);
            }
        }
    }
    failures
}
