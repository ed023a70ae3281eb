//! Lenient decoding of individual catalog records.
//!
//! Real catalog exports are inconsistent: ratings show up as numbers or
//! strings, optional fields are `null` or missing, and the odd record is not an
//! object at all. Decoding never fails on a single record.

use serde_json::{Map, Value};

use crate::CatalogEntry;

/// Decodes one record. Returns `None` for anything that is not a JSON object.
pub(crate) fn entry_from_value(value: &Value) -> Option<CatalogEntry> {
    let record = value.as_object()?;
    Some(CatalogEntry {
        name: text_field(record, "drug_name").unwrap_or_default(),
        condition: text_field(record, "medical_condition").unwrap_or_default(),
        side_effects: text_field(record, "side_effects").unwrap_or_default(),
        rating: scalar_field(record, "rating"),
        link: text_field(record, "drug_link"),
    })
}

fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key) {
        Some(Value::String(text)) => Some(text.clone()),
        _ => None,
    }
}

/// Like [`text_field`] but also accepts numbers, rendered as written.
fn scalar_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}
