//! Signing error taxonomy (§4.5.1 "Failure modes").

use thiserror::Error;

/// Errors raised while signing or verifying a CycloneDX document.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("failed to load signing key: {0}")]
    KeyLoadFailed(String),

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("key type does not match algorithm {algorithm}")]
    AlgorithmKeyMismatch { algorithm: String },

    #[error("signing operation failed")]
    SignFailed,

    #[error("document has no top-level signature field")]
    MissingSignature,

    #[error("canonicalization failed: {0}")]
    CanonicalizationFailed(String),

    #[error("the document is not valid JSON: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}
