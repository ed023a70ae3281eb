//! Content fingerprints.
//!
//! A fingerprint is the hex SHA-256 digest of raw bytes. The catalog loader
//! fingerprints its source so a persisted index can tell whether it was
//! built from the same catalog.
//!
//! ```rust
//! use canonical::fingerprint_bytes;
//!
//! let fp = fingerprint_bytes(b"[]");
//! assert_eq!(fp.len(), 64);
//! assert_eq!(fp, fingerprint_bytes(b"[]"));
//! ```

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes with SHA-256 and return the lowercase hex digest.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
