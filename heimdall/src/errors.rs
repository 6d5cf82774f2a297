//! The top-level error type [`Generator`](crate::Generator) callers see,
//! unifying the per-stage taxonomies (§7) behind one enum so the CLI and
//! C-ABI surfaces have a single thing to match on.

use thiserror::Error;

/// Errors surfaced by [`crate::Generator`].
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Input(#[from] heimdall_common::InputError),

    #[error(transparent)]
    Config(#[from] heimdall_common::ConfigError),

    #[error(transparent)]
    Document(#[from] heimdall_sbom::DocumentError),

    #[error(transparent)]
    Sign(#[from] heimdall_sign::SignError),

    #[error("output path is not writable: {0}")]
    UnwritableOutput(std::path::PathBuf),

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
