//! Conan / vcpkg probe (§4.3 step 2): looks for manifest markers adjacent
//! to, or in the installed-prefix of, the scanned file.
//!
//! Both package managers install into a predictable directory layout
//! rooted a few levels above the actual library/object file, so the probe
//! walks upward from `file_path` looking for the marker files each one
//! leaves behind, rather than trying to query a running package-manager
//! process (there usually isn't one at SBOM-generation time).

use std::path::Path;

use crate::system::SystemPackageInfo;
use crate::ProbeOutcome;

const CONAN_MARKERS: &[&str] = &["conaninfo.txt", "conanmanifest.txt", "conanfile.py", "conanfile.txt"];
const VCPKG_MARKERS: &[&str] = &["vcpkg.json", "CONTROL"];

/// Walks the ancestors of `file_path` (bounded to avoid scanning `/`)
/// looking for Conan or vcpkg manifest markers.
pub fn probe(file_path: &Path) -> ProbeOutcome {
    const MAX_ANCESTORS: usize = 8;

    for (depth, dir) in file_path.ancestors().enumerate() {
        if depth > MAX_ANCESTORS {
            break;
        }
        if dir.join(".conan").is_dir() || has_marker(dir, CONAN_MARKERS) {
            return ProbeOutcome::Enriched(conan_info(dir));
        }
        if dir.join("vcpkg_installed").is_dir() || has_marker(dir, VCPKG_MARKERS) {
            return ProbeOutcome::Enriched(vcpkg_info(dir));
        }
    }

    ProbeOutcome::NotApplicable
}

fn has_marker(dir: &Path, markers: &[&str]) -> bool {
    markers.iter().any(|m| dir.join(m).is_file())
}

fn conan_info(dir: &Path) -> SystemPackageInfo {
    let reference = std::fs::read_to_string(dir.join("conaninfo.txt"))
        .ok()
        .and_then(|text| {
            text.lines()
                .find(|l| l.starts_with("ref="))
                .map(|l| l.trim_start_matches("ref=").to_string())
        });

    let (name, version) = match reference {
        Some(r) => split_name_version(&r),
        None => (
            dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            None,
        ),
    };

    SystemPackageInfo {
        name,
        version,
        supplier: None,
        license: None,
    }
}

fn vcpkg_info(dir: &Path) -> SystemPackageInfo {
    if let Ok(text) = std::fs::read_to_string(dir.join("vcpkg.json")) {
        if let Some(name) = extract_json_string_field(&text, "name") {
            let version = extract_json_string_field(&text, "version")
                .or_else(|| extract_json_string_field(&text, "version-string"));
            return SystemPackageInfo {
                name,
                version,
                supplier: None,
                license: extract_json_string_field(&text, "license"),
            };
        }
    }

    SystemPackageInfo {
        name: dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        version: None,
        supplier: None,
        license: None,
    }
}

/// A minimal `"field": "value"` scanner — full `vcpkg.json` parsing would
/// pull in a JSON dependency for a probe that only needs two string
/// fields, so this stays a targeted regex-free scan instead.
fn extract_json_string_field(text: &str, field: &str) -> Option<String> {
    let needle = format!("\"{field}\"");
    let idx = text.find(&needle)?;
    let rest = &text[idx + needle.len()..];
    let colon = rest.find(':')?;
    let rest = rest[colon + 1..].trim_start();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn split_name_version(reference: &str) -> (String, Option<String>) {
    match reference.split_once('/') {
        Some((name, rest)) => {
            let version = rest.split('@').next().unwrap_or(rest);
            (name.to_string(), Some(version.to_string()))
        }
        None => (reference.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_vcpkg_json_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("vcpkg.json"),
            r#"{"name": "zlib", "version": "1.3.1"}"#,
        )
        .unwrap();
        let file = dir.path().join("lib").join("libz.a");

        let outcome = probe(&file);
        match outcome {
            ProbeOutcome::Enriched(info) => {
                assert_eq!(info.name, "zlib");
                assert_eq!(info.version.as_deref(), Some("1.3.1"));
            }
            other => panic!("expected Enriched, got {other:?}"),
        }
    }

    #[test]
    fn no_markers_is_not_applicable() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = probe(&dir.path().join("lib.a"));
        assert!(matches!(outcome, ProbeOutcome::NotApplicable));
    }
}
