//! Catalog data model.
//!
//! ```text
//! Catalog
//! ├── entries: Vec<CatalogEntry>   (position = identity)
//! │   ├── name          <- drug_name
//! │   ├── condition     <- medical_condition
//! │   ├── side_effects  <- side_effects
//! │   ├── rating        <- rating (string or number)
//! │   └── link          <- drug_link
//! ├── fingerprint: String          (SHA-256 of the source bytes)
//! └── repaired: bool               (true if the repair pass was needed)
//! ```
//!
//! Field values are kept exactly as they appear in the source. Cleaning
//! happens where text is embedded or returned, never here.

use serde::{Deserialize, Serialize};

/// One medicine record. Identity is its position in the [`Catalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "drug_name")]
    pub name: String,
    #[serde(rename = "medical_condition")]
    pub condition: String,
    pub side_effects: String,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(rename = "drug_link", default)]
    pub link: Option<String>,
}

impl CatalogEntry {
    /// Convenience constructor for entries without rating or link.
    pub fn new(
        name: impl Into<String>,
        condition: impl Into<String>,
        side_effects: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
            side_effects: side_effects.into(),
            rating: None,
            link: None,
        }
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// `true` when name, condition and side effects are all non-blank.
    ///
    /// Incomplete entries are still indexed so positions stay stable, but the
    /// allergy-aware search cannot assess them and skips them.
    pub fn has_required_fields(&self) -> bool {
        [&self.name, &self.condition, &self.side_effects]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// Raw `name condition side_effects` text, before normalization.
    pub fn composite_text(&self) -> String {
        format!("{} {} {}", self.name, self.condition, self.side_effects)
    }
}

/// The loaded catalog. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    fingerprint: String,
    repaired: bool,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>, fingerprint: impl Into<String>, repaired: bool) -> Self {
        Self {
            entries,
            fingerprint: fingerprint.into(),
            repaired,
        }
    }

    /// Builds a catalog from in-memory entries, fingerprinting their JSON form.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let bytes = serde_json::to_vec(&entries).unwrap_or_default();
        let fingerprint = canonical::fingerprint_bytes(&bytes);
        Self::new(entries, fingerprint, false)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CatalogEntry> {
        self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hex SHA-256 of the source the catalog was parsed from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Whether the repair pass was needed to parse the source.
    pub fn was_repaired(&self) -> bool {
        self.repaired
    }

    pub fn incomplete_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.has_required_fields())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_rejects_blank_values() {
        assert!(CatalogEntry::new("Aspirin", "headache", "stomach upset").has_required_fields());
        assert!(!CatalogEntry::new("Aspirin", "  ", "stomach upset").has_required_fields());
        assert!(!CatalogEntry::new("", "headache", "stomach upset").has_required_fields());
    }

    #[test]
    fn composite_text_joins_with_spaces() {
        let entry = CatalogEntry::new("Aspirin", "headache", "stomach upset");
        assert_eq!(entry.composite_text(), "Aspirin headache stomach upset");
    }

    #[test]
    fn entry_serializes_with_source_field_names() {
        let entry = CatalogEntry::new("Aspirin", "headache", "stomach upset")
            .with_rating("8.1")
            .with_link("https://example.org/aspirin");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["drug_name"], "Aspirin");
        assert_eq!(value["medical_condition"], "headache");
        assert_eq!(value["drug_link"], "https://example.org/aspirin");
    }

    #[test]
    fn from_entries_fingerprint_tracks_content() {
        let a = Catalog::from_entries(vec![CatalogEntry::new("A", "b", "c")]);
        let b = Catalog::from_entries(vec![CatalogEntry::new("A", "b", "d")]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.incomplete_count(), 0);
        assert!(!a.was_repaired());
    }
}
