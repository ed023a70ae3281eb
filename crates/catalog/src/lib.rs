//! Medicine catalog loading.
//!
//! The catalog is a JSON array of records with the fields `drug_name`,
//! `medical_condition`, `side_effects`, and optionally `rating` and
//! `drug_link`. Loading has two passes:
//!
//! 1. Parse the source as-is.
//! 2. Only if that fails, repair it (collapse whitespace, strip `( ... )`
//!    asides) and parse again.
//!
//! If both fail the loader returns [`CatalogError::Malformed`]. Individual
//! records that are not objects are skipped with a warning. Records with
//! missing fields are kept so catalog positions stay stable.
//!
//! ```rust
//! use catalog::load_catalog;
//!
//! let source = r#"[
//!     {"drug_name": "Aspirin", "medical_condition": "headache",
//!      "side_effects": "stomach upset", "rating": 8.1}
//! ] (exported from the formulary tool)"#;
//!
//! let catalog = load_catalog(source).unwrap();
//! assert_eq!(catalog.len(), 1);
//! assert!(catalog.was_repaired());
//! assert_eq!(catalog.entries()[0].rating.as_deref(), Some("8.1"));
//! ```

mod error;
mod record;
mod types;

use std::path::Path;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn, Level};

pub use crate::error::CatalogError;
pub use crate::types::{Catalog, CatalogEntry};

/// Parses a catalog from its raw source text.
pub fn load_catalog(source: &str) -> Result<Catalog, CatalogError> {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "catalog.load", source_len = source.len());
    let _guard = span.enter();

    let (records, repaired) = match parse_records(source) {
        Ok(records) => (records, false),
        Err(primary) => {
            warn!(error = %primary, "catalog_parse_failed_attempting_repair");
            let repaired_source = repair_source(source);
            match parse_records(&repaired_source) {
                Ok(records) => (records, true),
                Err(repaired) => {
                    let err = CatalogError::Malformed {
                        primary: primary.to_string(),
                        repaired: repaired.to_string(),
                    };
                    warn!(
                        error = %err,
                        elapsed_micros = start.elapsed().as_micros(),
                        "catalog_load_failure"
                    );
                    return Err(err);
                }
            }
        }
    };

    let mut entries = Vec::with_capacity(records.len());
    for (position, value) in records.iter().enumerate() {
        match record::entry_from_value(value) {
            Some(entry) => entries.push(entry),
            None => warn!(position, "catalog_record_not_an_object"),
        }
    }

    let catalog = Catalog::new(entries, canonical::fingerprint_bytes(source.as_bytes()), repaired);
    info!(
        entries = catalog.len(),
        incomplete = catalog.incomplete_count(),
        repaired,
        fingerprint = %catalog.fingerprint(),
        elapsed_micros = start.elapsed().as_micros(),
        "catalog_load_success"
    );
    Ok(catalog)
}

/// Reads and parses a catalog file.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|err| CatalogError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    load_catalog(&source)
}

fn parse_records(source: &str) -> Result<Vec<Value>, serde_json::Error> {
    serde_json::from_str(source)
}

fn repair_source(source: &str) -> String {
    let collapsed = canonical::collapse_whitespace(source);
    canonical::strip_parenthesized(&collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WELL_FORMED: &str = r#"[
        {"drug_name": "Aspirin", "medical_condition": "headache",
         "side_effects": "stomach upset", "rating": "8.1",
         "drug_link": "https://example.org/aspirin"},
        {"drug_name": "Cetirizine", "medical_condition": "allergies",
         "side_effects": "drowsiness, dry mouth"}
    ]"#;

    #[test]
    fn loads_well_formed_catalog_without_repair() {
        let catalog = load_catalog(WELL_FORMED).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.was_repaired());
        assert_eq!(catalog.entries()[1].name, "Cetirizine");
        assert!(catalog.entries()[1].rating.is_none());
        assert_eq!(catalog.fingerprint(), canonical::fingerprint_bytes(WELL_FORMED.as_bytes()));
    }

    #[test]
    fn repair_strips_asides_between_records() {
        let source = r#"[
            {"drug_name": "Aspirin", "medical_condition": "headache",
             "side_effects": "stomach upset"} (reviewed),
            {"drug_name": "Ibuprofen", "medical_condition": "pain",
             "side_effects": "heartburn"}
        ]"#;
        let catalog = load_catalog(source).unwrap();
        assert!(catalog.was_repaired());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[1].name, "Ibuprofen");
    }

    #[test]
    fn garbage_is_malformed() {
        let err = load_catalog("{{ definitely not a catalog").unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }

    #[test]
    fn object_root_is_malformed() {
        let err = load_catalog(r#"{"drug_name": "Aspirin"}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }

    #[test]
    fn non_object_records_are_skipped() {
        let catalog = load_catalog(
            r#"["stray", {"drug_name": "Aspirin", "medical_condition": "headache",
                 "side_effects": "stomach upset"}]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].name, "Aspirin");
    }

    #[test]
    fn incomplete_records_are_kept() {
        let catalog = load_catalog(r#"[{"drug_name": "Mystery"}]"#).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.incomplete_count(), 1);
    }

    #[test]
    fn empty_array_is_valid() {
        let catalog = load_catalog("[]").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(WELL_FORMED.as_bytes()).unwrap();
        let catalog = load_catalog_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_catalog_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
