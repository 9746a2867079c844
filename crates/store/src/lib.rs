//! Dhaal Store
//!
//! Persistence collaborators for the ingestion pipeline. Nothing in here knows
//! about duplicates or classification; it just writes and reads reports and
//! photos.
//!
//! - [`ReportStore`]: insert a report, list recent ones, find one by
//!   fingerprint. Implemented by [`InMemoryReportStore`] and
//!   [`RestReportStore`] (PostgREST).
//! - [`ImageStore`]: upload a photo, get an [`ImageRef`](ingest::ImageRef)
//!   back. Objects are content addressed (sha256 of the bytes), so
//!   re-uploading the same photo is idempotent.
//!
//! Pick backends from config with [`build_stores`]:
//!
//! ```
//! use store::{build_stores, StoreConfig};
//!
//! let stores = build_stores(&StoreConfig::default()).unwrap();
//! assert_eq!(stores.reports.name(), "memory");
//! ```

mod backend;
mod config;
mod error;
mod filter;
mod memory;
mod rest;

use std::sync::Arc;
use tracing::info;

pub use crate::backend::{object_name, ImageStore, ReportStore};
pub use crate::config::StoreConfig;
pub use crate::error::StoreError;
pub use crate::filter::ReportFilter;
pub use crate::memory::{InMemoryImageStore, InMemoryReportStore, MEMORY_SCHEME};
pub use crate::rest::{RestImageStore, RestReportStore};

/// The pair of stores a pipeline writes to.
#[derive(Clone)]
pub struct Stores {
    pub reports: Arc<dyn ReportStore>,
    pub images: Arc<dyn ImageStore>,
}

/// Build the report and image stores selected by `cfg.mode`.
pub fn build_stores(cfg: &StoreConfig) -> Result<Stores, StoreError> {
    cfg.validate()?;
    let stores = if cfg.is_rest() {
        Stores {
            reports: Arc::new(RestReportStore::new(cfg)?),
            images: Arc::new(RestImageStore::new(cfg)?),
        }
    } else {
        Stores {
            reports: Arc::new(InMemoryReportStore::new()),
            images: Arc::new(InMemoryImageStore::new()),
        }
    };
    info!(mode = %cfg.mode, backend = stores.reports.name(), "stores_ready");
    Ok(stores)
}
