//! The DWARF-extraction error taxonomy (§4.2, §7 "Debug-info errors").

use thiserror::Error;

/// Failures raised while extracting debug information from a binary.
///
/// These are never fatal to the extraction pipeline: `heimdall-component`
/// catches every variant and degrades to the heuristic or symbol-table
/// fallback (§4.2 "Failure semantics").
#[derive(Debug, Error)]
pub enum DwarfError {
    /// No debug section was present at all; informational, not a failure.
    #[error("no debug information present")]
    NoDebugInfo,

    /// The debug sections were present but could not be parsed.
    #[error("corrupt debug information: {0}")]
    Corrupt(String),

    /// This object format only supports the heuristic extractor (§4.2
    /// platform matrix: Mach-O / PE are "heuristic only").
    #[error("full DWARF parsing is not supported for this object format")]
    Unsupported,
}

impl From<gimli::Error> for DwarfError {
    fn from(e: gimli::Error) -> Self {
        DwarfError::Corrupt(e.to_string())
    }
}
