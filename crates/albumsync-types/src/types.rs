//! Core data types for albumsync
//!
//! This module provides the data types shared between the reconciliation core,
//! the remote collaborators, and the command-line front end.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

/// Unique identifier for sync runs
pub type RequestId = uuid::Uuid;

/// Provider-assigned identifier of a remote album
pub type AlbumId = String;

/// Provider-assigned identifier of a remote photo
pub type PhotoId = String;

/// Direction content flows in during one half of a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Local directory is the source, remote album the destination
    Push,
    /// Remote album is the source, local directory the destination
    Pull,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => f.write_str("push"),
            Self::Pull => f.write_str("pull"),
        }
    }
}

/// A single mutating operation the orchestrator can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    /// Local file to remote album
    Upload,
    /// Remote photo to local directory
    Download,
    /// Unlink a local file
    DeleteLocal,
    /// Delete a remote photo
    DeleteRemote,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Download => f.write_str("download"),
            Self::DeleteLocal => f.write_str("delete from local"),
            Self::DeleteRemote => f.write_str("delete from album"),
        }
    }
}

/// User-selected sync mode: four independent flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncMode {
    /// Local is the source, the album is the destination
    pub push: bool,
    /// The album is the source, local is the destination
    pub pull: bool,
    /// Remove destination content that is absent from the source
    pub prune: bool,
    /// Compare content checksums, not just titles
    pub checksum: bool,
}

impl SyncMode {
    /// Upload-only mode
    pub fn push() -> Self {
        Self {
            push: true,
            ..Self::default()
        }
    }

    /// Download-only mode
    pub fn pull() -> Self {
        Self {
            pull: true,
            ..Self::default()
        }
    }

    /// Enable pruning of destination-only content
    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    /// Enable checksum comparison
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    /// Directions requested by this mode, push first
    pub fn directions(&self) -> Vec<Direction> {
        let mut directions = Vec::with_capacity(2);
        if self.push {
            directions.push(Direction::Push);
        }
        if self.pull {
            directions.push(Direction::Pull);
        }
        directions
    }

    /// Reject flag combinations that would make the outcome ambiguous
    pub fn validate(&self) -> Result<()> {
        if !self.push && !self.pull {
            return Err(Error::config(format!(
                "Choose at least one action between --push or --pull. What was set: push={}, pull={}",
                self.push, self.pull
            )));
        }

        // Both directions leave nothing that is exclusive to a destination.
        if self.push && self.pull && self.prune {
            return Err(Error::config(format!(
                "Specifying --push and --pull and --sync all together makes no sense, nothing to remove. \
                 Choose at most two of them. What was set: push={}, pull={}, sync={}",
                self.push, self.pull, self.prune
            )));
        }

        if self.push && self.pull && self.checksum {
            return Err(Error::config(format!(
                "Specifying --push and --pull and --checksum all together makes no sense, \
                 which side's checksum is right? Choose at most two of them. \
                 What was set: push={}, pull={}, checksum={}",
                self.push, self.pull, self.checksum
            )));
        }

        Ok(())
    }
}

/// Statistics for one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncStats {
    /// Local files uploaded
    pub uploaded: u64,
    /// Remote photos downloaded
    pub downloaded: u64,
    /// Local files deleted
    pub deleted_local: u64,
    /// Remote photos deleted
    pub deleted_remote: u64,
    /// Items skipped by the content-type gate
    pub skipped: u64,
    /// Operations that failed
    pub failed: u64,
    /// Total duration of the run
    pub duration: Duration,
}

impl SyncStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfers in either direction
    pub fn transfers(&self) -> u64 {
        self.uploaded + self.downloaded
    }

    /// Deletions on either side
    pub fn deletions(&self) -> u64 {
        self.deleted_local + self.deleted_remote
    }

    /// Count one successful operation
    pub fn record(&mut self, operation: Operation) {
        match operation {
            Operation::Upload => self.uploaded += 1,
            Operation::Download => self.downloaded += 1,
            Operation::DeleteLocal => self.deleted_local += 1,
            Operation::DeleteRemote => self.deleted_remote += 1,
        }
    }
}

/// A photo as listed by the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RemoteEntry {
    /// Display title, matched against local file names
    pub title: String,
    /// Provider-assigned identifier
    pub photo_id: PhotoId,
    /// Tags attached to the photo
    pub tags: Vec<String>,
}

impl RemoteEntry {
    /// Create a listing entry
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
}

/// Content to upload into an album
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Raw file content
    pub content: Vec<u8>,
    /// Title the photo gets on the remote side
    pub title: String,
    /// Tags to attach
    pub tags: Vec<String>,
    /// Album name, used when the album has to be created
    pub album_name: String,
    /// Known album identifier, if the album already exists
    pub album_id: Option<AlbumId>,
}

/// Result of an upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The photo was stored and added to the album
    Uploaded {
        /// Identifier of the new photo
        photo_id: PhotoId,
        /// Identifier of the album it was added to, possibly just created
        album_id: AlbumId,
    },
    /// The service refused the content type
    Rejected {
        /// Reason given by the service
        reason: String,
    },
}
