//! Text cleaning for the medicine search pipeline.
//!
//! Every string that reaches the encoder, and every catalog field returned to
//! a caller, goes through this crate first.
//!
//! ## What we do
//!
//! - Replace characters outside letters, digits, whitespace and `. , ; : ! ? -`
//!   with spaces ([`normalize`])
//! - Collapse whitespace runs and trim ([`collapse_whitespace`])
//! - Strip `( ... )` asides when repairing malformed sources ([`strip_parenthesized`])
//! - Fingerprint raw bytes for cache invalidation ([`fingerprint_bytes`])
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. The same input gives the same
//! output on any machine, which is what lets a persisted index be reused
//! across restarts.

mod hash;
mod normalize;
mod whitespace;

pub use crate::hash::fingerprint_bytes;
pub use crate::normalize::{
    fold_name, is_allowed_char, normalize, normalize_value, ALLOWED_PUNCTUATION,
};
pub use crate::whitespace::{collapse_whitespace, strip_parenthesized};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_text_cleaning() {
        let composite = format!("{} {} {}", "Aspirin", "headache", "stomach upset (mild)");
        assert_eq!(normalize(&composite), "Aspirin headache stomach upset mild");
    }

    #[test]
    fn repair_pipeline_order() {
        let raw = "[ {\"a\":\n  1} ]  (exported 2021)";
        let repaired = strip_parenthesized(&collapse_whitespace(raw));
        assert_eq!(repaired.trim_end(), "[ {\"a\": 1} ]");
    }
}
