//! Free-text cleaning shared by the catalog, index, and matcher layers.
//!
//! [`normalize`] is the single cleaning rule applied to every piece of text
//! that is embedded or returned to a caller. Keeping it in one place is what
//! lets the index vectors and query vectors agree on their input space.

use serde_json::Value;

use crate::whitespace::collapse_whitespace;

/// Punctuation that survives [`normalize`] in addition to letters, digits and
/// whitespace.
pub const ALLOWED_PUNCTUATION: [char; 7] = ['.', ',', ';', ':', '!', '?', '-'];

/// Returns `true` when `c` is kept verbatim by [`normalize`].
#[inline]
pub fn is_allowed_char(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(&c)
}

/// Cleans free text for embedding and display.
///
/// Every character outside letters, digits, whitespace and
/// [`ALLOWED_PUNCTUATION`] is replaced by a space, whitespace runs collapse to
/// a single space, and the result is trimmed.
///
/// ```rust
/// use canonical::normalize;
///
/// assert_eq!(normalize("  Nausea/vomiting (rare)*  "), "Nausea vomiting rare");
/// assert_eq!(normalize("dizziness; headache!"), "dizziness; headache!");
/// ```
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if is_allowed_char(c) { c } else { ' ' })
        .collect();
    collapse_whitespace(&replaced)
}

/// [`normalize`] for loosely typed values. Anything that is not a JSON string
/// yields the empty string.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::String(text) => normalize(text),
        _ => String::new(),
    }
}

/// Normalized, lowercased form used for case-insensitive name comparison.
pub fn fold_name(text: &str) -> String {
    normalize(text).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn normalize_keeps_allowed_punctuation() {
        assert_eq!(normalize("a.b,c;d:e!f?g-h"), "a.b,c;d:e!f?g-h");
    }

    #[test]
    fn normalize_replaces_noise_with_space() {
        assert_eq!(normalize("stomach_upset&rash"), "stomach upset rash");
        assert_eq!(normalize("(itching)"), "itching");
    }

    #[test]
    fn normalize_keeps_unicode_letters() {
        assert_eq!(normalize("  Ärger  über   naïve "), "Ärger über naïve");
    }

    #[test]
    fn normalize_value_defensive_for_non_strings() {
        assert_eq!(normalize_value(&json!(null)), "");
        assert_eq!(normalize_value(&json!(4.5)), "");
        assert_eq!(normalize_value(&json!(["a"])), "");
        assert_eq!(normalize_value(&json!(" hi ")), "hi");
    }

    #[test]
    fn fold_name_is_case_insensitive() {
        assert_eq!(fold_name(" ASPIRIN "), fold_name("aspirin"));
    }

    proptest! {
        #[test]
        fn normalize_output_uses_allowed_set(input in "\\PC*") {
            let out = normalize(&input);
            prop_assert!(out.chars().all(is_allowed_char));
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(out.trim(), out.as_str());
            prop_assert!(!out.chars().any(|c| c.is_whitespace() && c != ' '));
        }

        #[test]
        fn normalize_is_idempotent(input in "\\PC*") {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
