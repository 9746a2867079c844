//! Dhaal Ingest Layer
//!
//! Typed values for one civic report submission, and the intake checks that
//! run before any external service is contacted.
//!
//! ## What lives here
//!
//! - [`UploadedImage`]: raw bytes + declared MIME type, ephemeral
//! - [`GeoPoint`]: validated WGS84 coordinates
//! - [`ImageRef`]: a stored image, either an object-storage URL or inline data
//! - [`Report`], [`ExistingReport`], [`ReportSummary`]: the durable entity and
//!   its read-only views
//! - [`accept_image`]: MIME normalization and size policy for uploads
//!
//! ## Example
//!
//! ```
//! use ingest::{accept_image, IngestConfig};
//!
//! let cfg = IngestConfig::default();
//! let image = accept_image(vec![0xff, 0xd8, 0xff], Some("IMAGE/JPEG"), &cfg).unwrap();
//! assert_eq!(image.mime_type(), "image/jpeg");
//! assert_eq!(image.size(), 3);
//! ```
use std::time::Instant;

use tracing::{debug, warn};

mod config;
mod error;
mod report;
mod types;

pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::report::{
    clamp_severity, ExistingReport, Priority, Report, ReportId, ReportStatus, ReportSummary,
    EMERGENCY_SEVERITY, MAX_SEVERITY, MIN_SEVERITY,
};
pub use crate::types::{GeoPoint, ImageRef, UploadedImage};

pub use fingerprint::Fingerprint;

/// Turn raw upload bytes into an [`UploadedImage`], enforcing the intake policy.
///
/// The declared MIME type is lowercased and stripped of parameters; a missing
/// or blank declaration falls back to `cfg.default_mime_type`.
pub fn accept_image(
    bytes: impl Into<bytes::Bytes>,
    declared_mime: Option<&str>,
    cfg: &IngestConfig,
) -> Result<UploadedImage, IngestError> {
    let start = Instant::now();
    let image = UploadedImage::new(bytes, normalize_mime(declared_mime, cfg));

    match validate_image(&image, cfg) {
        Ok(()) => {
            debug!(
                mime_type = %image.mime_type(),
                size = image.size(),
                elapsed_micros = start.elapsed().as_micros(),
                "image_accepted"
            );
            Ok(image)
        }
        Err(err) => {
            warn!(
                error = %err,
                mime_type = %image.mime_type(),
                size = image.size(),
                "image_rejected"
            );
            Err(err)
        }
    }
}

/// Check an already constructed image against the intake policy.
pub fn validate_image(image: &UploadedImage, cfg: &IngestConfig) -> Result<(), IngestError> {
    if image.is_empty() {
        return Err(IngestError::EmptyImage);
    }
    if let Some(limit) = cfg.max_image_bytes {
        if image.size() > limit {
            return Err(IngestError::ImageTooLarge {
                size: image.size(),
                limit,
            });
        }
    }
    if !image
        .mime_type()
        .starts_with(cfg.accepted_mime_prefix.as_str())
    {
        return Err(IngestError::UnsupportedMimeType(
            image.mime_type().to_string(),
        ));
    }
    Ok(())
}

fn normalize_mime(declared: Option<&str>, cfg: &IngestConfig) -> String {
    let essence = declared
        .and_then(|m| m.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if essence.is_empty() {
        cfg.default_mime_type.clone()
    } else {
        essence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_parameters_are_stripped() {
        let cfg = IngestConfig::default();
        let image = accept_image(vec![1u8], Some("image/png; charset=binary"), &cfg).unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn missing_mime_falls_back_to_default() {
        let cfg = IngestConfig::default();
        let image = accept_image(vec![1u8], None, &cfg).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        let image = accept_image(vec![1u8], Some("  "), &cfg).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
    }

    #[test]
    fn empty_image_is_rejected() {
        let cfg = IngestConfig::default();
        assert_eq!(
            accept_image(Vec::<u8>::new(), Some("image/jpeg"), &cfg),
            Err(IngestError::EmptyImage)
        );
    }

    #[test]
    fn oversized_image_is_rejected() {
        let cfg = IngestConfig {
            max_image_bytes: Some(4),
            ..Default::default()
        };
        assert_eq!(
            accept_image(vec![0u8; 5], Some("image/jpeg"), &cfg),
            Err(IngestError::ImageTooLarge { size: 5, limit: 4 })
        );
        assert!(accept_image(vec![0u8; 4], Some("image/jpeg"), &cfg).is_ok());
    }

    #[test]
    fn non_image_mime_is_rejected() {
        let cfg = IngestConfig::default();
        assert!(matches!(
            accept_image(vec![1u8], Some("application/pdf"), &cfg),
            Err(IngestError::UnsupportedMimeType(_))
        ));
    }

    #[test]
    fn unlimited_size_when_limit_is_disabled() {
        let cfg = IngestConfig {
            max_image_bytes: None,
            ..Default::default()
        };
        assert!(validate_image(&UploadedImage::new(vec![0u8; 64], "image/jpeg"), &cfg).is_ok());
    }
}
