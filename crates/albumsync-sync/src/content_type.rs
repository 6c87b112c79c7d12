//! Content-type gate for uploads
//!
//! Files are judged by their leading bytes, not by their name: an
//! extensionless JPEG is a photo, a text file called `notes.jpg` is not.

use albumsync_types::{Error, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Number of leading bytes inspected
pub const SNIFF_LEN: usize = 1024;

/// Detect an image MIME type from the first bytes of a file
pub fn sniff_image(head: &[u8]) -> Option<&'static str> {
    match head {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some("image/tiff"),
        [b'B', b'M', ..] if head.len() >= 14 => Some("image/bmp"),
        [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] if brand.len() >= 4 => {
            match &brand[..4] {
                b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" => Some("image/heic"),
                b"mif1" | b"msf1" => Some("image/heif"),
                b"avif" | b"avis" => Some("image/avif"),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Read up to [`SNIFF_LEN`] bytes of a file and detect its image type
pub async fn sniff_file(path: &Path) -> Result<Option<&'static str>> {
    let read_error = |e: std::io::Error| Error::Io {
        message: format!("Failed to read '{}': {}", path.display(), e),
    };

    let file = File::open(path).await.map_err(read_error)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(read_error)?;
    Ok(sniff_image(&head))
}
