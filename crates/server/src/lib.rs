//! # Medicine Search Server (`server`)
//!
//! HTTP front end for the [`matcher`] crate. The process loads the drug
//! catalog, builds or reloads the embedding index, then serves:
//!
//! - `GET /medicines` - allergy-aware symptom search with optional region
//!   availability
//! - `POST /nlp-search` - free-text search over the catalog
//! - `GET /regions`, `GET /pharmacies` - mock pharmacy availability data
//! - `GET /`, `GET /health`, `GET /ready`, `GET /metrics` - info, probes and
//!   Prometheus metrics
//!
//! Errors are JSON bodies of the form `{"error": {"code", "message"}}`.
//! Invalid parameters are `400 INVALID_REQUEST`; encoder or index failures are
//! `500`.
//!
//! Configuration comes from an optional `medsearch.*` file and
//! `MEDSEARCH__SECTION__KEY` environment variables; see [`AppConfig`].
//!
//! ```rust,no_run
//! use server::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{AppConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
