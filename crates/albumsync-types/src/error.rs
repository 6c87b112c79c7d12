//! Error types and handling for albumsync
//!
//! This module provides the error taxonomy shared by every albumsync crate:
//! configuration errors abort a run before anything is touched, per-item
//! errors are collected into a single [`Error::Batch`], and protocol errors
//! from remote collaborators are fatal for the call that raised them.

use crate::types::Operation;
use std::fmt;
use std::path::PathBuf;

/// One failed transfer or delete, collected during a batch
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemFailure {
    /// Operation that failed
    pub operation: Operation,
    /// Title of the item the operation targeted
    pub title: String,
    /// Error message
    pub message: String,
}

impl ItemFailure {
    /// Record a failure for an item
    pub fn new(operation: Operation, title: impl Into<String>, error: &Error) -> Self {
        Self {
            operation,
            title: title.into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\": {}", self.operation, self.title, self.message)
    }
}

/// Main error type for albumsync operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Local path not found
    #[error("Local path not found: {path}")]
    PathNotFound {
        /// Path that was not found
        path: PathBuf,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// The remote service answered with something unexpected
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message describing the unexpected response
        message: String,
    },

    /// The remote photo has no full-resolution representation
    #[error("Could not download photo {photo_id}: no original resolution is available")]
    NotRetrievable {
        /// Identifier of the remote photo
        photo_id: String,
    },

    /// One or more items of a sync batch failed
    #[error("{} operation(s) failed: {}", .failures.len(), join_failures(.failures))]
    Batch {
        /// Every failure collected during the run
        failures: Vec<ItemFailure>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

fn join_failures(failures: &[ItemFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Configuration errors
    Config,
    /// Network errors
    Network,
    /// Unexpected remote responses
    Protocol,
    /// Aggregated per-item failures
    Batch,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::PathNotFound { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Network { .. } => ErrorKind::Network,
            Self::Protocol { .. } | Self::NotRetrievable { .. } => ErrorKind::Protocol,
            Self::Batch { .. } => ErrorKind::Batch,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Whether the error must abort a run before any mutation happens
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::PathNotFound { .. })
    }

    /// Check if this error is recoverable by retrying the same call
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { message } => {
                message.contains("Interrupted")
                    || message.contains("WouldBlock")
                    || message.contains("TimedOut")
            }
            Self::Network { .. } => true,
            Self::PathNotFound { .. }
            | Self::Config { .. }
            | Self::Protocol { .. }
            | Self::NotRetrievable { .. }
            | Self::Batch { .. }
            | Self::Other { .. } => false,
        }
    }

    /// Failures collected by a batch, empty for every other variant
    pub fn failures(&self) -> &[ItemFailure] {
        match self {
            Self::Batch { failures } => failures,
            _ => &[],
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_error_kind_consistency(message in ".*") {
            let errors = vec![
                Error::Io { message: message.clone() },
                Error::Config { message: message.clone() },
                Error::Network { message: message.clone() },
                Error::Protocol { message: message.clone() },
                Error::Other { message: message.clone() },
            ];

            for error in errors {
                let kind = error.kind();
                match error {
                    Error::Io { .. } => prop_assert_eq!(kind, ErrorKind::Io),
                    Error::Config { .. } => prop_assert_eq!(kind, ErrorKind::Config),
                    Error::Network { .. } => prop_assert_eq!(kind, ErrorKind::Network),
                    Error::Protocol { .. } => prop_assert_eq!(kind, ErrorKind::Protocol),
                    Error::Other { .. } => prop_assert_eq!(kind, ErrorKind::Other),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_config_error_is_fatal() {
        let error = Error::config("choose --push or --pull");
        assert_eq!(error.kind(), ErrorKind::Config);
        assert!(error.is_fatal());
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_path_not_found() {
        let error = Error::PathNotFound {
            path: PathBuf::from("/missing/photos"),
        };
        assert!(error.is_fatal());
        assert!(error.to_string().contains("/missing/photos"));
    }

    #[test]
    fn test_network_error_is_recoverable() {
        let error = Error::network("connection reset");
        assert!(error.is_recoverable());
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_batch_error_summarises_failures() {
        let failures = vec![
            ItemFailure::new(Operation::Upload, "a.jpg", &Error::network("timed out")),
            ItemFailure::new(Operation::DeleteRemote, "b.jpg", &Error::protocol("stat=fail")),
        ];
        let error = Error::Batch { failures };

        let message = error.to_string();
        assert!(message.starts_with("2 operation(s) failed"));
        assert!(message.contains("upload \"a.jpg\""));
        assert!(message.contains("delete from album \"b.jpg\""));
        assert_eq!(error.failures().len(), 2);
        assert_eq!(error.kind(), ErrorKind::Batch);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.to_string().contains("test file"));
        assert!(error.failures().is_empty());
    }
}
