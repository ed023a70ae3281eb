//! Error types produced by the catalog crate.
//!
//! Both variants are fatal to startup: without a catalog there is nothing to
//! index. Individual bad records are not errors; they are skipped (non-object
//! records) or kept and flagged as incomplete (see
//! [`CatalogEntry::has_required_fields`](crate::CatalogEntry::has_required_fields)).
//!
//! | Error | Cause |
//! |-------|-------|
//! | [`Malformed`](CatalogError::Malformed) | Neither the raw source nor its repaired form parses as a JSON array |
//! | [`Io`](CatalogError::Io) | The catalog file could not be read |
//!
//! ```rust
//! use catalog::{load_catalog, CatalogError};
//!
//! match load_catalog("not json at all") {
//!     Err(CatalogError::Malformed { .. }) => {}
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
use thiserror::Error;

/// Errors that can occur while loading the medicine catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    /// The source failed to parse both as-is and after repair.
    ///
    /// Both parser messages are kept so operators can tell whether the repair
    /// pass made things better or worse.
    #[error("catalog is malformed: {primary}; after repair: {repaired}")]
    Malformed { primary: String, repaired: String },

    /// Reading the catalog file failed.
    #[error("failed to read catalog {path}: {message}")]
    Io { path: String, message: String },
}
