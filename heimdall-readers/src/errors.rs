//! Error taxonomy for the object readers (§4.1, §7 "Parse errors").

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while identifying or parsing a binary object.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("{path}: not a recognized object format")]
    UnknownFormat { path: PathBuf },

    #[error("{path}: truncated or corrupt {format} data")]
    Malformed {
        path: PathBuf,
        format: &'static str,
        #[source]
        source: goblin::error::Error,
    },

    #[error("{path}: archive member {member} could not be extracted")]
    ArchiveMember {
        path: PathBuf,
        member: String,
        #[source]
        source: goblin::error::Error,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ObjectError {
    pub fn malformed(path: PathBuf, format: &'static str, source: goblin::error::Error) -> Self {
        ObjectError::Malformed {
            path,
            format,
            source,
        }
    }
}
