//! Flickr photo service for albumsync
//!
//! Implements [`albumsync_types::PhotoService`] on top of the Flickr REST API:
//!
//! - **Albums**: photosets looked up by title, listed page by page with tags
//! - **Uploads**: multipart uploads added to the album, creating it on demand
//! - **Downloads**: the `Original` size of each photo
//! - **Signing**: OAuth 1.0a HMAC-SHA1 with a pre-issued access token
//! - **Retries**: exponential backoff on rate limiting and server errors
//!
//! # Examples
//!
//! ```rust,no_run
//! use albumsync_config::Config;
//! use albumsync_flickr::FlickrService;
//! use albumsync_types::PhotoService;
//!
//! # async fn example(config: Config) -> albumsync_types::Result<()> {
//! let service = FlickrService::from_settings(&config.credentials, &config.network)?;
//! let album = service.find_album("Holidays").await?;
//! println!("Album ID: {:?}", album);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod oauth;
pub mod types;

pub use client::{FlickrConfig, FlickrService};
pub use error::{FlickrError, Result};
pub use oauth::OAuthCredentials;
