//! Generic strings probe (§4.3 step 4): a last-resort, low-confidence
//! heuristic that looks for embedded version strings when nothing more
//! authoritative matched.
//!
//! Only runs when no earlier probe set `package_manager` (§4.3
//! "Short-circuit rule"), and only ever fills `version`/`properties` —
//! never `supplier` or `license`, since a bare version string carries no
//! evidence for either.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use heimdall_common::ComponentInfo;

use crate::ProbeOutcome;

/// Matches common `<name> X.Y(.Z)` / `version X.Y.Z` embedded strings,
/// e.g. `zlib 1.3.1`, `OpenSSL 3.0.13`, `version=2.4.1`.
static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:version[ =:]*)?v?([0-9]+\.[0-9]+(?:\.[0-9]+){0,2})\b").unwrap()
});

/// Scans raw file bytes for a plausible version string.
///
/// Bounded to the first `SCAN_LIMIT` bytes: a generic heuristic has no
/// business reading an entire multi-gigabyte binary end to end.
pub fn probe(raw_bytes: &[u8], component: &mut ComponentInfo) -> ProbeOutcome {
    const SCAN_LIMIT: usize = 4 * 1024 * 1024;
    let window = &raw_bytes[..raw_bytes.len().min(SCAN_LIMIT)];

    let Some(m) = VERSION_PATTERN.find(window) else {
        return ProbeOutcome::NotApplicable;
    };

    let version = String::from_utf8_lossy(m.as_bytes()).into_owned();
    component
        .properties
        .insert("attribution.generic.raw_match".to_string(), version.clone());

    if component.version.is_none() {
        // Keep only the numeric portion, stripping a leading `version=`
        // style prefix captured by the outer match.
        if let Some(caps) = VERSION_PATTERN.captures(window) {
            if let Some(num) = caps.get(1) {
                component.version = Some(String::from_utf8_lossy(num.as_bytes()).into_owned());
            }
        }
    }

    ProbeOutcome::Enriched(crate::system::SystemPackageInfo {
        name: component.name.clone(),
        version: component.version.clone(),
        supplier: None,
        license: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_embedded_version_string() {
        let mut component = ComponentInfo::new("libfoo", "/usr/lib/libfoo.so");
        let data = b"garbage\x00\x00zlib 1.3.1\x00more garbage";
        let outcome = probe(data, &mut component);
        assert!(matches!(outcome, ProbeOutcome::Enriched(_)));
        assert_eq!(component.version.as_deref(), Some("1.3.1"));
    }

    #[test]
    fn no_version_like_string_is_not_applicable() {
        let mut component = ComponentInfo::new("libfoo", "/usr/lib/libfoo.so");
        let outcome = probe(b"no numbers here at all", &mut component);
        assert!(matches!(outcome, ProbeOutcome::NotApplicable));
    }
}
