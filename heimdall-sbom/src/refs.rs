//! Stable ref/identifier derivation and dependency-string resolution,
//! shared by every format handler so that P6 ("every `ref` in
//! `dependsOn` exists in `components`") and P8 (stable serialization
//! order) hold identically across formats.

use std::collections::BTreeMap;
use std::path::Path;

use heimdall_common::ComponentInfo;

/// A short, stable fragment of a component's identity key, used as the
/// hash suffix of both `bom-ref` and `SPDXID` (§4.5: "`bom-ref` (stable,
/// derived from identity_key)"; "SPDXID is `SPDXRef-<sanitized-name>-
/// <short-hash>`").
fn short_hash(component: &ComponentInfo) -> &str {
    let key = component.identity_key().unwrap_or(&component.file_path);
    let end = key.len().min(12);
    &key[..end]
}

/// The CycloneDX `bom-ref` for a component: `<sanitized-name>-<short-hash>`.
pub fn bom_ref(component: &ComponentInfo) -> String {
    format!(
        "{}-{}",
        heimdall_common::sanitize_identifier(&component.name),
        short_hash(component)
    )
}

/// The SPDX `SPDXID` for a component: `SPDXRef-<sanitized-name>-<short-hash>`.
pub fn spdx_id(component: &ComponentInfo) -> String {
    format!(
        "SPDXRef-{}-{}",
        heimdall_common::sanitize_identifier(&component.name),
        short_hash(component)
    )
}

/// Returns the indices of `components` sorted by `ref_of`, the stable,
/// format-defined total order required by §5 ("Within a document,
/// components are serialized in a stable, format-defined order") and P8.
pub fn stable_order(components: &[ComponentInfo], ref_of: impl Fn(&ComponentInfo) -> String) -> Vec<usize> {
    let mut order: Vec<usize> = (0..components.len()).collect();
    order.sort_by_key(|&i| ref_of(&components[i]));
    order
}

/// Builds a lookup table from every string a dependency might name a
/// component by (its own name, full file path, path basename, and any
/// alias recorded during dedup) to that component's index, so that
/// `ComponentInfo::dependencies` entries (sonames or resolved paths, §3
/// I4) can be matched back to a published component's ref.
///
/// First component to claim a key wins; a later, distinct component
/// reusing the same basename never overwrites an earlier match, since
/// the dedup pass in `heimdall-component` already collapses genuinely
/// identical artifacts into one component.
fn build_key_index(components: &[ComponentInfo]) -> BTreeMap<String, usize> {
    let mut index = BTreeMap::new();
    for (i, component) in components.iter().enumerate() {
        let mut keys = vec![component.name.clone(), component.file_path.clone()];
        if let Some(base) = Path::new(&component.file_path).file_name() {
            keys.push(base.to_string_lossy().into_owned());
        }
        if let Some(aliases) = component.properties.get("aliases") {
            for alias in aliases.split(';').filter(|a| !a.is_empty()) {
                keys.push(alias.to_string());
                if let Some(base) = Path::new(alias).file_name() {
                    keys.push(base.to_string_lossy().into_owned());
                }
            }
        }
        for key in keys {
            index.entry(key).or_insert(i);
        }
    }
    index
}

/// For each component, the sorted list of refs (via `ref_of`) of the
/// other published components its `dependencies` strings resolve to.
/// Dependency strings with no matching published component are dropped
/// (§4.5 CycloneDX: "only emits refs that exist in `components`"; §4.4
/// I4: unresolved deps remain bare strings, never synthesized refs).
pub fn resolve_dependency_refs(
    components: &[ComponentInfo],
    ref_of: impl Fn(&ComponentInfo) -> String,
) -> Vec<Vec<String>> {
    let key_index = build_key_index(components);
    components
        .iter()
        .enumerate()
        .map(|(i, component)| {
            let mut refs: Vec<String> = component
                .dependencies
                .iter()
                .filter_map(|dep| {
                    let idx = key_index
                        .get(dep.as_str())
                        .or_else(|| key_index.get(Path::new(dep).file_name()?.to_str()?))?;
                    (*idx != i).then(|| ref_of(&components[*idx]))
                })
                .collect();
            refs.sort();
            refs.dedup();
            refs
        })
        .collect()
}

/// If `component` is an archive member (its `file_path` was built as
/// `<archive-path>(<member>)` by the extractor, §4.1 "Archives produce
/// one child `ObjectView` per member"), returns the archive's path so
/// callers can emit a `CONTAINS` relationship (§4.5 SPDX 2.3
/// "Relationships").
pub fn archive_member_parent(component: &ComponentInfo) -> Option<&str> {
    let path = component.file_path.as_str();
    if !path.ends_with(')') {
        return None;
    }
    let open = path.find('(')?;
    if open == 0 {
        return None;
    }
    Some(&path[..open])
}

#[cfg(test)]
mod tests {
    use super::*;
    use heimdall_common::{ChecksumAlgorithm, FileType};

    fn component(name: &str, path: &str, deps: Vec<&str>) -> ComponentInfo {
        let mut c = ComponentInfo::new(name, path);
        c.checksums.insert(ChecksumAlgorithm::Sha256, "a".repeat(64));
        c.file_type = FileType::SharedLibrary;
        c.dependencies = deps.into_iter().map(String::from).collect();
        c.derive_identity_key();
        c.mark_processed();
        c
    }

    #[test]
    fn resolves_dependency_by_basename() {
        let app = component("app", "/bin/app", vec!["libfoo.so"]);
        let libfoo = component("libfoo.so", "/lib/libfoo.so", vec![]);
        let components = vec![app, libfoo];
        let refs = resolve_dependency_refs(&components, bom_ref);
        assert_eq!(refs[0], vec![bom_ref(&components[1])]);
        assert!(refs[1].is_empty());
    }

    #[test]
    fn unresolved_dependency_is_dropped_not_synthesized() {
        let app = component("app", "/bin/app", vec!["libunknown.so"]);
        let components = vec![app];
        let refs = resolve_dependency_refs(&components, bom_ref);
        assert!(refs[0].is_empty());
    }

    #[test]
    fn archive_member_parent_detects_parenthesized_suffix() {
        let member = component("foo.o", "/build/libfoo.a(foo.o)", vec![]);
        assert_eq!(archive_member_parent(&member), Some("/build/libfoo.a"));
        let plain = component("app", "/bin/app", vec![]);
        assert_eq!(archive_member_parent(&plain), None);
    }

    #[test]
    fn stable_order_is_a_total_order_over_refs() {
        let a = component("zzz", "/bin/zzz", vec![]);
        let b = component("aaa", "/bin/aaa", vec![]);
        let components = vec![a, b];
        let order = stable_order(&components, bom_ref);
        assert_eq!(
            order.iter().map(|&i| bom_ref(&components[i])).collect::<Vec<_>>(),
            {
                let mut refs: Vec<_> = components.iter().map(bom_ref).collect();
                refs.sort();
                refs
            }
        );
    }
}
