//! The `.debug_line` heuristic fallback (§4.2 strategy 2).
//!
//! Used when the full DWARF parser raises `Corrupt`/`Unsupported`, or is
//! not applicable to the object format at all (Mach-O, PE). This scan
//! never resolves compile units or functions — only source file names —
//! and is deliberately conservative: a string that merely looks like a
//! path is kept, nothing is validated against the rest of the section.

use std::collections::BTreeSet;

/// Scans raw `.debug_line` bytes for NUL-terminated strings that look like
/// source file names, in the spirit of DWARF's `file_names` table without
/// actually parsing the line-number program header (§4.2: "linear scan of
/// `.debug_line` for file-name records").
pub fn scan_source_files(debug_line: &[u8]) -> BTreeSet<String> {
    let mut files = BTreeSet::new();
    for chunk in debug_line.split(|&b| b == 0) {
        if let Some(name) = candidate_file_name(chunk) {
            files.insert(name);
        }
    }
    files
}

fn candidate_file_name(chunk: &[u8]) -> Option<String> {
    if chunk.len() < 3 || chunk.len() > 260 {
        return None;
    }
    if !chunk.iter().all(|&b| (0x20..0x7f).contains(&b)) {
        return None;
    }
    let text = std::str::from_utf8(chunk).ok()?;
    // A plausible source file has a `.<ext>` suffix and no control/glob
    // characters one would not expect in a path.
    let has_extension = text.rsplit('.').next().map(|ext| !ext.is_empty() && ext.len() <= 5 && ext != text).unwrap_or(false);
    if !has_extension {
        return None;
    }
    if text.contains(['\t', '\n', '\r', '<', '>', '|', '*', '?']) {
        return None;
    }
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plausible_file_names() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"main.c\0");
        buf.extend_from_slice(b"\x01\x02\x03\0"); // not printable, skipped
        buf.extend_from_slice(b"include/util.h\0");
        buf.extend_from_slice(b"not_a_file_name_no_dot\0");
        let files = scan_source_files(&buf);
        assert!(files.contains("main.c"));
        assert!(files.contains("include/util.h"));
        assert!(!files.contains("not_a_file_name_no_dot"));
    }

    #[test]
    fn empty_input_yields_no_files() {
        assert!(scan_source_files(&[]).is_empty());
    }
}
