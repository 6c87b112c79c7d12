//! Reconciliation and sync orchestration for albumsync
//!
//! This crate decides what has to move between a local directory and a remote
//! album, then moves it:
//!
//! - **Checksum tags**: MD5 content digests stored as `checksum:md5=<hex>` tags
//! - **Items**: local files and remote photos behind one [`PhotoItem`] trait
//! - **Reconciliation**: title-keyed classification into local-only, remote-only
//!   and mismatched items
//! - **Orchestration**: ordered push/pull batches with pruning, dry-run and
//!   aggregated failures
//! - **Progress Tracking**: narration events and counters for front ends
//!
//! # Examples
//!
//! ```rust
//! use albumsync_sync::{MemoryPhotoService, SyncEngine, SyncOptions, SyncRequest};
//! use albumsync_types::SyncMode;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncEngine::new(Arc::new(MemoryPhotoService::new()));
//! let request = SyncRequest::new("Holidays", "photos")
//!     .with_options(SyncOptions::new(SyncMode::push().with_checksum(true)));
//! let report = engine.run(request).await?;
//! println!("Uploaded {} photos", report.stats.uploaded);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod checksum;
pub mod content_type;
pub mod context;
pub mod diff;
pub mod engine;
pub mod item;
pub mod loader;
pub mod memory;
pub mod progress;

pub use context::{AlbumSlot, SyncContext};
pub use diff::{diff, Classification, DiffEngine};
pub use engine::{sync, SyncEngine, SyncOptions, SyncReport, SyncRequest};
pub use item::{LocalItem, MismatchedPair, PhotoItem, RemoteItem, TransferOutcome};
pub use loader::{load_local, load_remote};
pub use memory::{MemoryPhotoService, StoredPhoto, UploadRecord};
pub use progress::{format_duration, ProgressReporter, StatusEvent, SyncPhase, SyncProgress};
