//! Path normalization helpers shared across the extraction pipeline.

use std::borrow::Cow;

fn is_path_separator(c: char) -> bool {
    matches!(c, '\\' | '/')
}

fn pop_path(path: &mut String) -> bool {
    if let Some(idx) = path.rfind(is_path_separator) {
        path.truncate(idx);
        true
    } else if !path.is_empty() {
        path.truncate(0);
        true
    } else {
        false
    }
}

/// Simplifies a path by stripping redundant `.`/`..` components.
///
/// This is a lexical operation: it does not touch the file system and does
/// not resolve symlinks, so the result can be lossy for paths that traverse
/// them. It is used to normalize source-file paths recovered from DWARF
/// and from Ada `.ali` records before they are stored on a component.
///
/// ```
/// use heimdall_common::path::clean_path;
/// assert_eq!(clean_path("/a/./b"), "/a/b");
/// assert_eq!(clean_path("/a/b/../c"), "/a/c");
/// ```
pub fn clean_path(path: &str) -> Cow<'_, str> {
    let mut rv = String::with_capacity(path.len());
    let mut needs_separator = false;
    let mut is_past_root = false;

    for segment in path.split_terminator(is_path_separator) {
        if segment == "." {
            continue;
        } else if segment == ".." {
            if !is_past_root && pop_path(&mut rv) {
                if rv.is_empty() {
                    needs_separator = false;
                }
            } else {
                if !is_past_root {
                    needs_separator = false;
                    is_past_root = true;
                }
                if needs_separator {
                    rv.push('/');
                }
                rv.push_str("..");
                needs_separator = true;
            }
            continue;
        }
        if needs_separator {
            rv.push('/');
        } else {
            needs_separator = true;
        }
        rv.push_str(segment);
    }

    if path.starts_with('/') && !rv.starts_with('/') {
        rv.insert(0, '/');
    }

    Cow::Owned(rv)
}

/// Strips every character that is not `[A-Za-z0-9.-]`.
///
/// Used to build SPDX `SPDXRef-<sanitized-name>-<short-hash>` identifiers
/// (§4.5 SPDX 2.3) from an arbitrary component name.
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_path_collapses_dotdot() {
        assert_eq!(clean_path("/a/b/../c"), "/a/c");
        assert_eq!(clean_path("/a/./b"), "/a/b");
        assert_eq!(clean_path("/foo/../../b"), "../b");
    }

    #[test]
    fn sanitize_identifier_strips_illegal_chars() {
        assert_eq!(sanitize_identifier("libfoo++.so"), "libfoo--.so");
        assert_eq!(sanitize_identifier("a_b c"), "a-b-c");
    }
}
