//! The input-error taxonomy shared by the object readers (§4.1) and the
//! component extractor (§4.4).
//!
//! Debug-info, attribution, document and signing errors have their own
//! taxonomies local to the crates that raise them (`heimdall-dwarf`,
//! `heimdall-attributors`, `heimdall-sbom`, `heimdall-sign`) rather than
//! a single crate-wide error enum.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures opening or recognizing an input file (§4.1 `open`, §7 "Input
/// errors").
#[derive(Debug, Error)]
pub enum InputError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("unrecognized object format: {0}")]
    UnrecognizedFormat(PathBuf),

    #[error("truncated or corrupt file: {0}")]
    Truncated(PathBuf),

    #[error("unsupported architecture in {path}: {detail}")]
    UnsupportedArchitecture { path: PathBuf, detail: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InputError {
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => InputError::NotFound(path),
            io::ErrorKind::PermissionDenied => InputError::PermissionDenied(path),
            _ => InputError::Io { path, source },
        }
    }

    /// The `[ERROR] <kind>: <detail>` tag used in the single-line stderr
    /// message format (§7 "User-visible behavior").
    pub fn kind_tag(&self) -> &'static str {
        match self {
            InputError::NotFound(_) => "NotFound",
            InputError::PermissionDenied(_) => "PermissionDenied",
            InputError::UnrecognizedFormat(_) => "UnrecognizedFormat",
            InputError::Truncated(_) => "Truncated",
            InputError::UnsupportedArchitecture { .. } => "UnsupportedArchitecture",
            InputError::Io { .. } => "Io",
        }
    }
}

/// Fatal, batch-aborting configuration failures (§7 "Configuration
/// errors").
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("output path is not writable: {0}")]
    UnwritableOutput(PathBuf),

    #[error("conflicting options: {0}")]
    ConflictingOptions(String),
}
