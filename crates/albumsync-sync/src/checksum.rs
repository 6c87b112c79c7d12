//! Checksum tags and content digests
//!
//! Remote photos carry their content digest as a tag of the form
//! `checksum:md5=<hex>`. The photo service normalises tags when listing them,
//! stripping punctuation, so the same tag may come back as `checksummd5<hex>`.
//! Both forms decode to the same digest.

use albumsync_types::{Error, Result};
use md5::{Digest, Md5};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Prefix used when attaching a checksum tag
pub const CHECKSUM_TAG_PREFIX: &str = "checksum:md5=";

/// Prefix a checksum tag carries after the service has normalised it
pub const NORMALIZED_CHECKSUM_TAG_PREFIX: &str = "checksummd5";

/// Files are hashed in chunks of this many bytes
pub const CHUNK_SIZE: usize = 1 << 20;

/// Encode a checksum as a remote tag
pub fn encode(checksum: &str) -> String {
    format!("{}{}", CHECKSUM_TAG_PREFIX, checksum)
}

/// Decode a checksum from a remote tag.
///
/// Returns an empty string when the tag is not a checksum tag, or when the
/// suffix after the prefix is empty.
pub fn decode(tag: &str) -> String {
    tag.strip_prefix(CHECKSUM_TAG_PREFIX)
        .or_else(|| tag.strip_prefix(NORMALIZED_CHECKSUM_TAG_PREFIX))
        .unwrap_or_default()
        .to_string()
}

/// First non-empty checksum found in a tag set
pub fn find_in_tags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(|tag| decode(tag.as_ref()))
        .find(|checksum| !checksum.is_empty())
        .unwrap_or_default()
}

/// Reject user tags that could be mistaken for a checksum tag or split by the service
pub fn validate_user_tag(tag: &str) -> Result<()> {
    if tag.starts_with(CHECKSUM_TAG_PREFIX) || tag.starts_with(NORMALIZED_CHECKSUM_TAG_PREFIX) {
        return Err(Error::config(format!(
            "Tag must not start with \"{}\" or \"{}\", got \"{}\"",
            CHECKSUM_TAG_PREFIX, NORMALIZED_CHECKSUM_TAG_PREFIX, tag
        )));
    }
    if tag.contains(' ') {
        return Err(Error::config(format!(
            "Tag must not contain spaces, got \"{}\"",
            tag
        )));
    }
    Ok(())
}

/// Hex MD5 digest of in-memory content
pub fn content_checksum(content: &[u8]) -> String {
    format!("{:x}", Md5::digest(content))
}

/// Hex MD5 digest of a file, read in [`CHUNK_SIZE`] chunks
pub async fn file_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).await.map_err(|e| Error::Io {
        message: format!("Failed to open '{}': {}", path.display(), e),
    })?;

    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer).await.map_err(|e| Error::Io {
            message: format!("Failed to read '{}': {}", path.display(), e),
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
