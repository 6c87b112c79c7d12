//! Result type alias for albumsync operations

use crate::Error;

/// Result type alias for albumsync operations
pub type Result<T> = std::result::Result<T, Error>;
