//! Core type system and error handling for albumsync
//!
//! This crate provides the foundational types shared by every albumsync
//! crate. It includes:
//!
//! - **Error handling**: one error enum with kinds and per-item batch failures
//! - **Core types**: sync modes, operations, remote listings and statistics
//! - **Traits**: the async [`PhotoService`] seam to a remote album host
//! - **Configuration**: validated concurrency, retry and timeout values
//!
//! # Features
//!
//! - `std` (default): Enable standard library features
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use albumsync_types::{Result, SyncMode};
//!
//! fn choose_mode() -> Result<SyncMode> {
//!     let mode = SyncMode::push().with_prune(true);
//!     mode.validate()?;
//!     Ok(mode)
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{Concurrency, RetryConfig, TimeoutConfig};
pub use error::{Error, ErrorKind, ItemFailure};
pub use result::Result;
pub use traits::*;
pub use types::*;
