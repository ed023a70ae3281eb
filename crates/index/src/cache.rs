//! On-disk cache artifact for a built [`EmbeddingIndex`].
//!
//! Layout: the 4-byte magic `MSIX`, one codec byte (`0` raw, `1` zstd), then
//! a bincode-encoded [`CacheArtifact`]. The artifact records the schema
//! version, the catalog fingerprint and the index itself (which carries the
//! encoder model name and width).
//!
//! Loading never fails. Anything short of a fully valid artifact that
//! matches the current catalog and encoder is a [`CacheLookup::Miss`] with a
//! reason, and the caller rebuilds.

use std::fmt;
use std::path::{Path, PathBuf};

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};

use crate::{CompressionCodec, CompressionConfig, EmbeddingIndex, IndexError};

/// Bump this value whenever the on-disk [`CacheArtifact`] layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

const ARTIFACT_MAGIC: &[u8; 4] = b"MSIX";
const CODEC_RAW: u8 = 0;
const CODEC_ZSTD: u8 = 1;

/// Persisted form of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheArtifact {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub catalog_fingerprint: String,
    pub index: EmbeddingIndex,
}

const fn default_schema_version() -> u16 {
    INDEX_SCHEMA_VERSION
}

/// What a loaded artifact must match to be reused.
#[derive(Debug, Clone, Copy)]
pub struct CacheExpectations<'a> {
    pub model_name: &'a str,
    pub catalog_fingerprint: &'a str,
    pub entry_count: usize,
}

/// Outcome of a cache lookup.
#[derive(Debug)]
pub enum CacheLookup {
    Hit(EmbeddingIndex),
    Miss(CacheMissReason),
}

/// Why a persisted artifact was not reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMissReason {
    /// Caching is switched off.
    Disabled,
    /// No artifact exists at the configured path.
    Absent,
    /// The artifact exists but could not be read.
    Unreadable(String),
    /// Bad magic, unknown codec, truncated data, or a decode failure.
    Corrupt(String),
    SchemaMismatch { found: u16, expected: u16 },
    ModelMismatch { found: String, expected: String },
    CatalogChanged,
    CountMismatch { found: usize, expected: usize },
    /// The decoded index violates its own length or width invariants.
    Inconsistent(String),
}

impl fmt::Display for CacheMissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheMissReason::Disabled => write!(f, "cache disabled"),
            CacheMissReason::Absent => write!(f, "no cache artifact"),
            CacheMissReason::Unreadable(err) => write!(f, "cache unreadable: {err}"),
            CacheMissReason::Corrupt(err) => write!(f, "cache corrupt: {err}"),
            CacheMissReason::SchemaMismatch { found, expected } => {
                write!(f, "schema version {found}, expected {expected}")
            }
            CacheMissReason::ModelMismatch { found, expected } => {
                write!(f, "built with model '{found}', expected '{expected}'")
            }
            CacheMissReason::CatalogChanged => write!(f, "catalog fingerprint changed"),
            CacheMissReason::CountMismatch { found, expected } => {
                write!(f, "{found} entries cached, catalog has {expected}")
            }
            CacheMissReason::Inconsistent(err) => write!(f, "cache inconsistent: {err}"),
        }
    }
}

/// Serializes `index` into artifact bytes.
pub fn encode_artifact(
    index: &EmbeddingIndex,
    catalog_fingerprint: &str,
    compression: &CompressionConfig,
) -> Result<Vec<u8>, IndexError> {
    let artifact = CacheArtifact {
        schema_version: INDEX_SCHEMA_VERSION,
        catalog_fingerprint: catalog_fingerprint.to_owned(),
        index: index.clone(),
    };
    let payload = encode_to_vec(&artifact, standard())?;

    let (codec, body) = match compression.codec {
        CompressionCodec::None => (CODEC_RAW, payload),
        CompressionCodec::Zstd => (CODEC_ZSTD, compression.compress(&payload)?),
    };

    let mut bytes = Vec::with_capacity(ARTIFACT_MAGIC.len() + 1 + body.len());
    bytes.extend_from_slice(ARTIFACT_MAGIC);
    bytes.push(codec);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Parses artifact bytes and checks them against `expect`.
pub fn decode_artifact(bytes: &[u8], expect: CacheExpectations<'_>) -> CacheLookup {
    let artifact = match parse_artifact(bytes) {
        Ok(artifact) => artifact,
        Err(reason) => return CacheLookup::Miss(reason),
    };

    if artifact.schema_version != INDEX_SCHEMA_VERSION {
        return CacheLookup::Miss(CacheMissReason::SchemaMismatch {
            found: artifact.schema_version,
            expected: INDEX_SCHEMA_VERSION,
        });
    }
    if artifact.index.model_name() != expect.model_name {
        return CacheLookup::Miss(CacheMissReason::ModelMismatch {
            found: artifact.index.model_name().to_owned(),
            expected: expect.model_name.to_owned(),
        });
    }
    if artifact.catalog_fingerprint != expect.catalog_fingerprint {
        return CacheLookup::Miss(CacheMissReason::CatalogChanged);
    }
    if artifact.index.len() != expect.entry_count {
        return CacheLookup::Miss(CacheMissReason::CountMismatch {
            found: artifact.index.len(),
            expected: expect.entry_count,
        });
    }
    if let Err(err) = artifact.index.validate() {
        return CacheLookup::Miss(CacheMissReason::Inconsistent(err.to_string()));
    }

    CacheLookup::Hit(artifact.index)
}

fn parse_artifact(bytes: &[u8]) -> Result<CacheArtifact, CacheMissReason> {
    let header_len = ARTIFACT_MAGIC.len() + 1;
    if bytes.len() < header_len || &bytes[..ARTIFACT_MAGIC.len()] != ARTIFACT_MAGIC {
        return Err(CacheMissReason::Corrupt("missing artifact header".into()));
    }

    let body = &bytes[header_len..];
    let payload = match bytes[ARTIFACT_MAGIC.len()] {
        CODEC_RAW => body.to_vec(),
        CODEC_ZSTD => zstd::decode_all(body).map_err(|e| CacheMissReason::Corrupt(e.to_string()))?,
        other => return Err(CacheMissReason::Corrupt(format!("unknown codec byte {other}"))),
    };

    let (artifact, consumed): (CacheArtifact, usize) =
        decode_from_slice(&payload, standard()).map_err(|e| CacheMissReason::Corrupt(e.to_string()))?;
    if consumed != payload.len() {
        return Err(CacheMissReason::Corrupt(format!(
            "{} trailing bytes after artifact",
            payload.len() - consumed
        )));
    }
    Ok(artifact)
}

/// Reads and validates the artifact at `path`.
pub fn load_cache(path: &Path, expect: CacheExpectations<'_>) -> CacheLookup {
    match std::fs::read(path) {
        Ok(bytes) => decode_artifact(&bytes, expect),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            CacheLookup::Miss(CacheMissReason::Absent)
        }
        Err(err) => CacheLookup::Miss(CacheMissReason::Unreadable(err.to_string())),
    }
}

/// Writes artifact bytes to `path` through a sibling temp file and a rename,
/// so readers never observe a half-written artifact.
pub fn write_cache(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let persist_err = |err: std::io::Error| IndexError::Persist {
        path: path.display().to_string(),
        message: err.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let tmp = temp_path(path);
    std::fs::write(&tmp, bytes).map_err(persist_err)?;
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(persist_err(err));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
