// error.rs - Error taxonomy shared by the codec, allele-hash store, database
// writer, and search engine.

use thiserror::Error;

/// Error taxonomy for the core library.
///
/// `LookupMiss` is deliberately not constructed as an error anywhere in this
/// crate -- a checksum absent from the allele-hash store is resolved to the
/// novel-bit by the codec, not propagated. It remains part of the enum so
/// callers that want to distinguish "known allele" from "novel allele" can
/// match on it explicitly if they reach for the resolver directly.
#[derive(Debug, Error)]
pub enum HcLinkError {
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("I/O failure: {0}")]
    IoFailure(String),

    #[error("upstream request failed: {0}")]
    UpstreamFailure(String),

    #[error("allele checksum not found in store: {checksum} @ locus {locus_index}")]
    LookupMiss { checksum: String, locus_index: usize },
}

impl From<std::io::Error> for HcLinkError {
    fn from(err: std::io::Error) -> Self {
        HcLinkError::IoFailure(err.to_string())
    }
}

impl From<serde_json::Error> for HcLinkError {
    fn from(err: serde_json::Error) -> Self {
        HcLinkError::IoFailure(format!("JSON error: {err}"))
    }
}

impl From<rusqlite::Error> for HcLinkError {
    fn from(err: rusqlite::Error) -> Self {
        HcLinkError::IoFailure(format!("sqlite error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, HcLinkError>;
