//! Error types for the Flickr service

use thiserror::Error;

/// Flickr error code for an unknown photoset
pub const CODE_PHOTOSET_NOT_FOUND: i64 = 1;

/// Flickr upload error code for an unsupported file type
pub const CODE_FILETYPE_NOT_RECOGNISED: i64 = 5;

/// Flickr service errors
#[derive(Error, Debug)]
pub enum FlickrError {
    /// The API answered with `stat="fail"`
    #[error("Flickr API error {code}: {message}")]
    Api {
        /// Flickr error code
        code: i64,
        /// Flickr error message
        message: String,
    },

    /// Non-success HTTP status
    #[error("HTTP error (status {status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Connection, timeout or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Failed to parse an API response
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// No original-size download is offered for the photo
    #[error("Photo {photo_id} has no original size available")]
    NotRetrievable {
        /// Photo identifier
        photo_id: String,
    },

    /// Credentials are incomplete
    #[error("Missing credentials: {0}")]
    Credentials(String),
}

impl FlickrError {
    /// Whether the API reported the given error code
    pub fn has_code(&self, expected: i64) -> bool {
        matches!(self, Self::Api { code, .. } if *code == expected)
    }

    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Network(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FlickrError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::Http {
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        if error.is_decode() {
            return Self::Parse(error.to_string());
        }
        if error.is_timeout() {
            return Self::Network("Request timed out".to_string());
        }
        if error.is_connect() {
            return Self::Network(format!("Connection failed: {}", error));
        }
        Self::Network(error.to_string())
    }
}

impl From<serde_json::Error> for FlickrError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

impl From<FlickrError> for albumsync_types::Error {
    fn from(error: FlickrError) -> Self {
        match error {
            FlickrError::NotRetrievable { photo_id } => Self::NotRetrievable { photo_id },
            FlickrError::Credentials(message) => Self::config(message),
            e if e.is_transient() => Self::network(e.to_string()),
            e => Self::protocol(e.to_string()),
        }
    }
}

/// Result type for Flickr operations
pub type Result<T> = std::result::Result<T, FlickrError>;

#[cfg(test)]
mod tests {
    use super::*;
    use albumsync_types::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case(FlickrError::Http { status: 503, message: String::new() }, true)]
    #[case(FlickrError::Http { status: 429, message: String::new() }, true)]
    #[case(FlickrError::Http { status: 404, message: String::new() }, false)]
    #[case(FlickrError::Network("reset".to_string()), true)]
    #[case(FlickrError::Api { code: 1, message: "Photoset not found".to_string() }, false)]
    fn test_is_transient(#[case] error: FlickrError, #[case] expected: bool) {
        assert_eq!(error.is_transient(), expected);
    }

    #[test]
    fn test_conversion_to_core_error() {
        let error: albumsync_types::Error = FlickrError::NotRetrievable {
            photo_id: "42".to_string(),
        }
        .into();
        assert!(matches!(error, albumsync_types::Error::NotRetrievable { .. }));

        let error: albumsync_types::Error = FlickrError::Network("reset".to_string()).into();
        assert_eq!(error.kind(), ErrorKind::Network);

        let error: albumsync_types::Error = FlickrError::Api {
            code: 99,
            message: "Insufficient permissions".to_string(),
        }
        .into();
        assert_eq!(error.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_has_code() {
        let error = FlickrError::Api {
            code: CODE_PHOTOSET_NOT_FOUND,
            message: "Photoset not found".to_string(),
        };
        assert!(error.has_code(CODE_PHOTOSET_NOT_FOUND));
        assert!(!error.has_code(CODE_FILETYPE_NOT_RECOGNISED));
    }
}
