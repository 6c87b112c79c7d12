//! Flickr API response types
//!
//! Data structures for deserializing the JSON responses of the Flickr REST
//! API (`format=json&nojsoncallback=1`) and the XML response of the upload
//! endpoint.

use crate::error::{FlickrError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text wrapped in a `{"_content": ...}` object
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    /// Text
    #[serde(rename = "_content", default)]
    pub content: String,
}

/// `flickr.test.login` response
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    /// Authenticated user
    pub user: LoginUser,
}

/// Authenticated user
#[derive(Debug, Deserialize)]
pub struct LoginUser {
    /// NSID of the user
    pub id: String,
    /// Screen name
    #[serde(default)]
    pub username: Content,
}

/// `flickr.photosets.getList` response
#[derive(Debug, Deserialize)]
pub struct PhotosetListResponse {
    /// One page of photosets
    pub photosets: PhotosetPage,
}

/// One page of photosets
#[derive(Debug, Deserialize)]
pub struct PhotosetPage {
    /// Total number of pages
    #[serde(deserialize_with = "number_or_string")]
    pub pages: u32,
    /// Photosets on this page
    #[serde(default)]
    pub photoset: Vec<Photoset>,
}

/// A photoset (album)
#[derive(Debug, Deserialize)]
pub struct Photoset {
    /// Photoset identifier
    pub id: String,
    /// Photoset title
    pub title: Content,
}

/// `flickr.photosets.getPhotos` response
#[derive(Debug, Deserialize)]
pub struct PhotosetPhotosResponse {
    /// One page of the photoset's photos
    pub photoset: PhotosetPhotosPage,
}

/// One page of photos of a photoset
#[derive(Debug, Deserialize)]
pub struct PhotosetPhotosPage {
    /// Total number of pages
    #[serde(deserialize_with = "number_or_string")]
    pub pages: u32,
    /// Photos on this page
    #[serde(default)]
    pub photo: Vec<PhotosetPhoto>,
}

/// A photo in a photoset listing, requested with `extras=tags`
#[derive(Debug, Deserialize)]
pub struct PhotosetPhoto {
    /// Photo identifier
    pub id: String,
    /// Photo title
    #[serde(default)]
    pub title: String,
    /// Space-separated normalized tags
    #[serde(default)]
    pub tags: String,
}

impl PhotosetPhoto {
    /// Individual tags
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split_whitespace()
    }
}

/// `flickr.photosets.create` response
#[derive(Debug, Deserialize)]
pub struct CreatePhotosetResponse {
    /// The new photoset
    pub photoset: CreatedPhotoset,
}

/// A newly created photoset
#[derive(Debug, Deserialize)]
pub struct CreatedPhotoset {
    /// Photoset identifier
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// `flickr.photos.getSizes` response
#[derive(Debug, Deserialize)]
pub struct SizesResponse {
    /// Available sizes
    pub sizes: Sizes,
}

/// Available sizes of a photo
#[derive(Debug, Deserialize)]
pub struct Sizes {
    /// One entry per resolution
    #[serde(default)]
    pub size: Vec<Size>,
}

/// One resolution of a photo
#[derive(Debug, Deserialize)]
pub struct Size {
    /// Resolution name, `Original` for the uploaded content
    pub label: String,
    /// URL of the image data
    pub source: String,
}

impl Sizes {
    /// URL of the original upload, if offered
    pub fn original_source(&self) -> Option<&str> {
        self.size
            .iter()
            .find(|size| size.label == "Original")
            .map(|size| size.source.as_str())
    }
}

/// Check the `stat` field of a JSON response, surfacing API failures
pub fn check_stat(value: &Value) -> Result<()> {
    match value.get("stat").and_then(Value::as_str) {
        Some("ok") => Ok(()),
        Some(_) => Err(FlickrError::Api {
            code: value.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        }),
        None => Err(FlickrError::Parse(
            "response carries no \"stat\" field".to_string(),
        )),
    }
}

/// Outcome of the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResponse {
    /// The photo was stored
    Ok {
        /// New photo identifier
        photo_id: String,
    },
    /// The upload was refused
    Failed {
        /// Flickr error code
        code: i64,
        /// Flickr error message
        message: String,
    },
}

/// Parse the `<rsp>` document returned by the upload endpoint
pub fn parse_upload_response(body: &str) -> Result<UploadResponse> {
    let mut reader = Reader::from_str(body);
    let mut stat = None;
    let mut photo_id = None;
    let mut err = None;
    let mut in_photo_id = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.name().as_ref() == b"photoid" => in_photo_id = true,
            Event::End(e) if e.name().as_ref() == b"photoid" => in_photo_id = false,
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"rsp" => stat = attribute(&e, "stat")?,
                b"err" => err = Some((attribute(&e, "code")?, attribute(&e, "msg")?)),
                _ => {}
            },
            Event::Text(text) if in_photo_id => {
                photo_id = Some(text.unescape().map_err(xml_error)?.trim().to_string());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let stat = stat
        .ok_or_else(|| FlickrError::Parse(format!("unexpected upload response: {}", body)))?;
    if stat == "ok" {
        let photo_id = photo_id
            .ok_or_else(|| FlickrError::Parse("upload response has no photoid".to_string()))?;
        return Ok(UploadResponse::Ok { photo_id });
    }

    let (code, message) = err.unwrap_or_default();
    Ok(UploadResponse::Failed {
        code: code.and_then(|code| code.parse().ok()).unwrap_or(0),
        message: message.unwrap_or(stat),
    })
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    element
        .try_get_attribute(name)
        .map_err(xml_error)?
        .map(|attr| {
            attr.unescape_value()
                .map(|value| value.into_owned())
                .map_err(xml_error)
        })
        .transpose()
}

fn xml_error(error: impl std::fmt::Display) -> FlickrError {
    FlickrError::Parse(format!("malformed upload response: {}", error))
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid page count {}", n))),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "expected a page count, got {}",
            other
        ))),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected an identifier, got {}",
            other
        ))),
    }
}
