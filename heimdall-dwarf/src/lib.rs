//! The DWARF Extractor (§4.2): enriches a component with source files,
//! compile units and functions recovered from debug information.
//!
//! Two strategies are tried in order, splitting a full parser from the
//! coarser information object readers can offer on their own:
//!
//!   1. full DWARF via [`full::extract`] (ELF only, §4.2 platform matrix);
//!   2. the `.debug_line` heuristic in [`heuristic`] (all formats).
//!
//! Every public entry point goes through [`lock::serialized`], because the
//! design treats DWARF extraction as a hard single-threaded contract
//! regardless of whether the underlying parser actually needs it (§4.2,
//! §5, §9).

#![warn(missing_docs)]
#![allow(missing_docs)]

pub mod errors;
pub mod full;
pub mod heuristic;
pub mod lock;

use std::collections::BTreeSet;

use heimdall_readers::ObjectView;

pub use errors::DwarfError;
pub use full::FullDwarfResult;

/// The combined result of a DWARF extraction pass, regardless of which
/// strategy produced it. `contains_debug_info` tells the caller whether
/// `functions`/`compile_units` came from real debug data or from the
/// symbol-table fallback (§4.2 "If neither yields data... falls back
/// further to the symbol table").
#[derive(Debug, Default, Clone)]
pub struct ExtractionResult {
    pub source_files: BTreeSet<String>,
    pub compile_units: Vec<String>,
    pub functions: BTreeSet<String>,
    pub contains_debug_info: bool,
}

/// Sections the heuristic scan looks at, in priority order. `.zdebug_line`
/// is GNU's compressed-section naming convention and is intentionally not
/// decompressed here — the heuristic is a coarse best-effort fallback, and
/// `section_data` already decompresses standard-compressed sections.
const DEBUG_LINE_CANDIDATES: &[&str] = &[".debug_line", "__debug_line", ".debug$S"];

/// Runs the two-strategy DWARF extraction against an already-parsed
/// object, falling back to the exported-symbol table when neither DWARF
/// strategy finds anything (§4.2 "Failure semantics": downgrades are never
/// fatal to the caller).
///
/// This is the single public entry point other crates should call; it
/// always serializes on the process-wide lock itself, so callers must not
/// wrap it in another lock acquisition.
pub fn extract(view: &ObjectView<'_>) -> ExtractionResult {
    lock::serialized(|| extract_locked(view))
}

fn extract_locked(view: &ObjectView<'_>) -> ExtractionResult {
    use heimdall_readers::FileFormat;

    let full_result = if view.format() == FileFormat::Elf {
        let sections: Vec<(&'static str, Option<std::borrow::Cow<[u8]>>)> = [
            ".debug_info",
            ".debug_abbrev",
            ".debug_str",
            ".debug_str_offsets",
            ".debug_line",
            ".debug_line_str",
            ".debug_ranges",
            ".debug_rnglists",
            ".debug_addr",
            ".debug_loc",
            ".debug_loclists",
        ]
        .iter()
        .map(|&name| (name, view.section_data(name)))
        .collect();

        full::extract(view.is_little_endian(), |name| {
            sections
                .iter()
                .find(|(n, _)| *n == name)
                .and_then(|(_, data)| data.as_deref())
        })
    } else {
        Err(DwarfError::Unsupported)
    };

    match full_result {
        Ok(full) => {
            return ExtractionResult {
                source_files: full.source_files,
                compile_units: dedup_preserve_order(full.compile_units),
                functions: full.functions,
                contains_debug_info: true,
            };
        }
        Err(DwarfError::NoDebugInfo) => {}
        Err(err) => {
            tracing::debug!(error = %err, "full DWARF parse failed, degrading to heuristic");
        }
    }

    let heuristic_files = DEBUG_LINE_CANDIDATES
        .iter()
        .find_map(|name| view.section_data(name))
        .map(|data| heuristic::scan_source_files(&data))
        .unwrap_or_default();

    if !heuristic_files.is_empty() {
        return ExtractionResult {
            source_files: heuristic_files,
            compile_units: Vec::new(),
            functions: symbol_fallback(view),
            contains_debug_info: false,
        };
    }

    ExtractionResult {
        source_files: BTreeSet::new(),
        compile_units: Vec::new(),
        functions: symbol_fallback(view),
        contains_debug_info: false,
    }
}

/// `functions` from exported text symbols, demangled (§4.2: "the
/// Extractor falls back further to the symbol table").
fn symbol_fallback(view: &ObjectView<'_>) -> BTreeSet<String> {
    view.symbols()
        .into_iter()
        .filter(|sym| !sym.name.is_empty())
        .map(|sym| heimdall_demangle::demangle_str(&sym.name).into_owned())
        .collect()
}

fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// `true` if any DWARF-ish debug data (embedded or heuristically
/// scannable) is present, without doing a full extraction pass.
pub fn has_dwarf_info(view: &ObjectView<'_>) -> bool {
    use heimdall_readers::DebugInfoProbe;
    matches!(view.probe_debug_info(), DebugInfoProbe::Embedded { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserve_order_keeps_first_occurrence() {
        let out = dedup_preserve_order(vec!["a".into(), "b".into(), "a".into(), "c".into()]);
        assert_eq!(out, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }
}
