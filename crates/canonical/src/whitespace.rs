//! Whitespace and aside removal utilities.
//!
//! [`collapse_whitespace`] collapses consecutive whitespace into single spaces
//! and [`strip_parenthesized`] removes `( ... )` asides. The catalog loader
//! uses both to repair catalog sources that fail to parse as-is.
//!
//! # Whitespace Definition
//!
//! This crate uses Unicode's definition of whitespace, which includes:
//! - ASCII space (U+0020)
//! - ASCII tab (U+0009)
//! - ASCII newline (U+000A)
//! - ASCII carriage return (U+000D)
//! - And many other Unicode whitespace characters
//!
//! # Examples
//!
//! ```rust
//! use canonical::{collapse_whitespace, strip_parenthesized};
//!
//! assert_eq!(collapse_whitespace("  hello   world  "), "hello world");
//! assert_eq!(strip_parenthesized("aspirin (generic) tablets"), "aspirin  tablets");
//! ```

/// Collapses repeated whitespace, trims edges, and normalizes newlines to
/// single spaces.
///
/// # Algorithm
///
/// 1. Split the text on any Unicode whitespace (using `split_whitespace()`)
/// 2. Join the resulting segments with single ASCII spaces
/// 3. The result has no leading or trailing whitespace
///
/// # Examples
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("hello\t\t\tworld"), "hello world");
/// assert_eq!(collapse_whitespace("hello\r\nworld"), "hello world");
/// assert_eq!(collapse_whitespace("hello\u{00A0}world"), "hello world");
/// assert_eq!(collapse_whitespace("   \n\t   "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}

/// Removes every parenthesized aside from `text`.
///
/// An aside runs from an opening `(` to the next `)`. Asides do not nest: in
/// `"a (b (c) d) e"` the first aside ends at the first `)`, leaving
/// `"a  d) e"`. An opening parenthesis with no closing one is kept verbatim
/// together with everything after it.
///
/// Surrounding whitespace is left untouched so callers can decide whether to
/// collapse it afterwards.
///
/// ```rust
/// use canonical::strip_parenthesized;
///
/// assert_eq!(strip_parenthesized("[1, 2] (trailing note)"), "[1, 2] ");
/// assert_eq!(strip_parenthesized("open ( only"), "open ( only");
/// ```
pub fn strip_parenthesized(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_handles_mixed_runs() {
        assert_eq!(collapse_whitespace(" a \t b\n\nc "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn strip_parenthesized_removes_multiple_asides() {
        assert_eq!(
            strip_parenthesized("x (one) y (two) z"),
            "x  y  z",
        );
    }

    #[test]
    fn strip_parenthesized_does_not_nest() {
        assert_eq!(strip_parenthesized("a (b (c) d) e"), "a  d) e");
    }

    #[test]
    fn strip_parenthesized_keeps_unterminated_open() {
        assert_eq!(strip_parenthesized("a (b) c (d"), "a  c (d");
    }

    #[test]
    fn strip_parenthesized_handles_multibyte_text() {
        assert_eq!(strip_parenthesized("café (naïve) déjà"), "café  déjà");
    }
}
