//! Classification of local and remote items by title

use crate::item::{LocalItem, MismatchedPair, PhotoItem, RemoteItem};
use albumsync_types::Result;
use std::collections::BTreeMap;
use tracing::info;

/// Three-way classification of two collections
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Items only present locally, sorted by title
    pub local_only: Vec<LocalItem>,
    /// Items only present remotely, in listing order
    pub remote_only: Vec<RemoteItem>,
    /// Items present on both sides with differing checksums, in listing order
    pub mismatched: Vec<MismatchedPair>,
}

impl Classification {
    /// Whether both collections are already in agreement
    pub fn is_empty(&self) -> bool {
        self.local_only.is_empty() && self.remote_only.is_empty() && self.mismatched.is_empty()
    }

    /// Local sides of the mismatched pairs
    pub fn mismatched_local(&self) -> Vec<LocalItem> {
        self.mismatched.iter().map(|pair| pair.local.clone()).collect()
    }

    /// Remote sides of the mismatched pairs
    pub fn mismatched_remote(&self) -> Vec<RemoteItem> {
        self.mismatched
            .iter()
            .map(|pair| pair.remote.clone())
            .collect()
    }
}

/// Engine for classifying items
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine {
    checksum: bool,
}

impl DiffEngine {
    /// Create a diff engine; `checksum` enables content comparison of same-titled items
    pub fn new(checksum: bool) -> Self {
        Self { checksum }
    }

    /// Classify local and remote items.
    ///
    /// Checksums are only computed for titles present on both sides, and only
    /// when checksum comparison is enabled. Duplicate local titles keep the
    /// last item.
    pub async fn diff(
        &self,
        local: Vec<LocalItem>,
        remote: Vec<RemoteItem>,
    ) -> Result<Classification> {
        let mut local_only: BTreeMap<String, LocalItem> = local
            .into_iter()
            .map(|item| (item.identity().to_string(), item))
            .collect();
        let mut remote_only = Vec::new();
        let mut mismatched = Vec::new();

        for remote_item in remote {
            let Some(local_item) = local_only.remove(remote_item.identity()) else {
                remote_only.push(remote_item);
                continue;
            };

            if self.checksum {
                let local_checksum = local_item.checksum().await?;
                let remote_checksum = remote_item.checksum().await?;
                if local_checksum != remote_checksum {
                    info!(
                        "Mismatched checksums on \"{}\": local={}, remote={}",
                        remote_item.identity(),
                        local_checksum,
                        remote_checksum
                    );
                    mismatched.push(MismatchedPair {
                        local: local_item,
                        remote: remote_item,
                    });
                }
            }
        }

        let classification = Classification {
            local_only: local_only.into_values().collect(),
            remote_only,
            mismatched,
        };

        info!(
            "Local only: {:?}",
            titles(classification.local_only.iter())
        );
        info!(
            "Remote only: {:?}",
            titles(classification.remote_only.iter())
        );
        info!(
            "Mismatched: {:?}",
            titles(classification.mismatched.iter().map(|pair| &pair.local))
        );

        Ok(classification)
    }
}

/// Classify local and remote items, see [`DiffEngine::diff`]
pub async fn diff(
    local: Vec<LocalItem>,
    remote: Vec<RemoteItem>,
    checksum_enabled: bool,
) -> Result<Classification> {
    DiffEngine::new(checksum_enabled).diff(local, remote).await
}

fn titles<'a, T: PhotoItem + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<&'a str> {
    items.map(|item| item.identity()).collect()
}
