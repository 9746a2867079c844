//! Core value types that flow through one report submission.
//!
//! ```text
//! UploadedImage ──fingerprint()──▶ Fingerprint
//!      │
//!      ├──to_data_url()──▶ ImageRef::Inline   (degraded storage mode)
//!      └──(image store upload)──▶ ImageRef::Url
//!
//! GeoPoint  (validated WGS84 lat/lng)
//! ```
//!
//! [`UploadedImage`] is ephemeral: it lives for one submission request and is
//! never persisted. Only its derived artifacts (fingerprint, image reference)
//! end up on a stored report.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::IngestError;

/// Raw image bytes plus the MIME type declared by the client.
///
/// Cloning is cheap: the buffer is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    bytes: Bytes,
    mime_type: String,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the image in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Coarse content signature used for duplicate pre-filtering.
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint::fingerprint(&self.bytes)
    }

    /// Standard base64 encoding of the bytes, as sent to the oracle.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Inline `data:` URL representation of the image.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type, `jpg` when unknown.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/heic" => "heic",
            "image/heif" => "heif",
            "image/bmp" => "bmp",
            _ => "jpg",
        }
    }
}

/// A resolved WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, IngestError> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(IngestError::InvalidLocation { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Where a stored report's image lives.
///
/// Persisted as a single string column: either a URL into object storage or,
/// when the upload failed, an inline `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ImageRef {
    Url(String),
    Inline { mime_type: String, data: String },
}

impl ImageRef {
    /// Interpret a stored image column.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("data:") {
            if let Some((header, data)) = rest.split_once(',') {
                if let Some(mime_type) = header.strip_suffix(";base64") {
                    return ImageRef::Inline {
                        mime_type: mime_type.to_string(),
                        data: data.to_string(),
                    };
                }
            }
        }
        ImageRef::Url(raw.to_string())
    }

    /// Inline reference holding the whole image.
    pub fn inline(image: &UploadedImage) -> Self {
        ImageRef::Inline {
            mime_type: image.mime_type().to_string(),
            data: image.to_base64(),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ImageRef::Inline { .. })
    }

    /// True when nothing was stored (legacy rows with an empty image column).
    pub fn is_empty(&self) -> bool {
        match self {
            ImageRef::Url(url) => url.trim().is_empty(),
            ImageRef::Inline { data, .. } => data.trim().is_empty(),
        }
    }

    /// Decode an inline reference back into image bytes.
    ///
    /// Returns `Ok(None)` for URL references; those must be fetched.
    pub fn decode_inline(&self) -> Result<Option<UploadedImage>, IngestError> {
        match self {
            ImageRef::Url(_) => Ok(None),
            ImageRef::Inline { mime_type, data } => {
                let bytes = STANDARD
                    .decode(data.trim())
                    .map_err(|e| IngestError::InvalidImageRef(format!("bad base64 payload: {e}")))?;
                Ok(Some(UploadedImage::new(bytes, mime_type.clone())))
            }
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Url(url) => f.write_str(url),
            ImageRef::Inline { mime_type, data } => write!(f, "data:{mime_type};base64,{data}"),
        }
    }
}

impl From<ImageRef> for String {
    fn from(value: ImageRef) -> Self {
        match value {
            ImageRef::Url(url) => url,
            inline => inline.to_string(),
        }
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        ImageRef::parse(&value)
    }
}
