//! Shared vocabulary for every format-specific reader (§4.1).

/// The concrete binary container format a reader identified (§3 `FileType`
/// is derived from this plus the path's role — archive member vs.
/// top-level file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Elf,
    MachO,
    Pe,
    Archive,
    Unknown,
}

impl FileFormat {
    pub fn name(self) -> &'static str {
        match self {
            FileFormat::Elf => "elf",
            FileFormat::MachO => "macho",
            FileFormat::Pe => "pe",
            FileFormat::Archive => "archive",
            FileFormat::Unknown => "unknown",
        }
    }
}

/// What a reader could tell about the presence of debug information,
/// without actually parsing DWARF (§4.1 "debug info presence probe").
///
/// This is intentionally cheap and format-specific: it looks at section or
/// segment names only. The expensive, authoritative answer comes from
/// `heimdall-dwarf`'s extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugInfoProbe {
    /// No debug sections/segments found; the binary appears stripped.
    None,
    /// Debug sections were found embedded in the binary itself.
    Embedded { sections: Vec<String> },
    /// A link to an external debug file was found (ELF `.gnu_debuglink`,
    /// PE CodeView PDB path).
    External { path: String },
}

/// One resolved (or unresolved-but-named) runtime dependency (§3
/// `dependencies`): a shared library name as recorded in the binary's
/// dynamic section / load commands / import table, before any
/// filesystem resolution.
pub type Dependency = String;
