//! Document-engine error taxonomy (§4.5, §7 "Document errors").

use thiserror::Error;

/// Failures raised while resolving a handler or generating a document.
///
/// Every variant aborts the specific `generate`/`resolve` call and leaves
/// no output file behind (§7 "Document-engine errors abort the specific
/// `generate` call and leave no output file behind" — enforced by the
/// caller, which only writes bytes once `generate` returns `Ok`).
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unknown SBOM format: {0}")]
    UnknownFormat(String),

    #[error("unknown {family} version: {version}")]
    UnknownVersion { family: &'static str, version: String },

    #[error("failed to serialize document: {0}")]
    SerializationFailed(String),
}

impl From<serde_json::Error> for DocumentError {
    fn from(e: serde_json::Error) -> Self {
        DocumentError::SerializationFailed(e.to_string())
    }
}
