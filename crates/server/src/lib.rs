//! HTTP API for the Dhaal civic report pipeline.
//!
//! A thin adapter: JSON bodies are decoded into typed values (photos arrive
//! base64 encoded) and handed to the [`dhaal::IngestionCoordinator`].
//! Outcome codes map onto HTTP statuses:
//!
//! | Outcome | Status |
//! |---|---|
//! | `SUBMITTED_OK`, `DUPLICATE_WARNED_PROCEED` | 201 |
//! | `DUPLICATE_BLOCKED` | 409 |
//! | `LOCATION_MISSING` | 400 |
//! | `CLASSIFICATION_FAILED` | 502 |
//! | `STORE_FAILED` | 503 |
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /`, `GET /health`, `GET /ready`
//! - `POST /api/v1/reports/analyze`: duplicate warning or classification
//! - `POST /api/v1/reports`: full submission
//! - `GET /api/v1/reports`: recent reports (`limit`, `status`, `minSeverity`, `category`)
//! - `POST /api/v1/duplicates/check`: duplicate verdict only
//! - `POST /api/v1/translate`: description translation
//!
//! The caller is identified by the `x-user-id` header and `x-locale` selects
//! description translation.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
