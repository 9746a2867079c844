//! Error types produced by the ingest crate.
//!
//! Every variant is a validation failure detected before any external call is
//! made, so callers can map all of them to a client-side error (HTTP 400/413).
//!
//! ```rust
//! use ingest::IngestError;
//!
//! fn to_http_status(error: &IngestError) -> u16 {
//!     match error {
//!         IngestError::ImageTooLarge { .. } => 413,
//!         _ => 400,
//!     }
//! }
//!
//! assert_eq!(to_http_status(&IngestError::EmptyImage), 400);
//! ```
use thiserror::Error;

/// Errors that can occur while validating submission values.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum IngestError {
    /// The uploaded image has zero bytes.
    #[error("image payload is empty")]
    EmptyImage,

    /// The uploaded image exceeds the configured size limit.
    #[error("image is {size} bytes, limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },

    /// The declared MIME type is not an image type.
    #[error("unsupported mime type: {0}")]
    UnsupportedMimeType(String),

    /// Latitude/longitude outside WGS84 ranges or not finite.
    #[error("invalid location: lat={lat}, lng={lng}")]
    InvalidLocation { lat: f64, lng: f64 },

    /// A stored image reference could not be decoded.
    #[error("invalid image reference: {0}")]
    InvalidImageRef(String),

    /// A report field failed validation (e.g. unknown status label).
    #[error("invalid report field: {0}")]
    InvalidField(String),
}
