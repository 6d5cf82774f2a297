//! Package-Manager & Language Attributors (§4.3): probes that enrich a
//! component with supplier/version/license provenance after the object
//! readers and DWARF extractor have run.
//!
//! Probes run in a fixed order — system, then Conan/vcpkg, then Ada
//! `.ali`, then the generic strings fallback — and the first one that
//! reports [`ProbeOutcome::Enriched`] sets `package_manager`; later probes
//! may still contribute non-conflicting fields (§4.3 "Short-circuit
//! rule").

#![warn(missing_docs)]
#![allow(missing_docs)]

pub mod ali;
pub mod conan;
pub mod context;
pub mod generic;
pub mod system;

use heimdall_common::{ComponentInfo, PackageManager};

pub use context::AttributorContext;
pub use system::SystemPackageInfo;

/// The result of running one attributor against a component (§4.3 probe
/// contract).
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The probe has nothing to say about this component.
    NotApplicable,
    /// The probe found provenance data and applied it.
    Enriched(SystemPackageInfo),
    /// The probe tried to run but failed (non-fatal — §7 "Attribution
    /// errors").
    Error(String),
}

/// Runs every attributor against `component` in the fixed order from
/// §4.3, honoring the short-circuit rule.
///
/// `raw_bytes` feeds the generic strings probe; pass an empty slice when
/// the caller has already released the backing buffer (the probe simply
/// finds nothing and reports `NotApplicable`).
pub fn run_attributors(component: &mut ComponentInfo, ctx: &AttributorContext, raw_bytes: &[u8]) {
    let mut package_manager_set = false;
    let mut warnings = Vec::new();

    let system_outcome = system::probe(std::path::Path::new(&component.file_path));
    apply_outcome(
        component,
        &mut package_manager_set,
        &mut warnings,
        "system",
        PackageManager::System,
        system_outcome,
    );

    if !package_manager_set {
        let conan_outcome = conan::probe(std::path::Path::new(&component.file_path));
        let is_vcpkg = matches!(
            &conan_outcome,
            ProbeOutcome::Enriched(info) if looks_like_vcpkg(&component.file_path, &info.name)
        );
        apply_outcome(
            component,
            &mut package_manager_set,
            &mut warnings,
            "conan",
            if is_vcpkg { PackageManager::Vcpkg } else { PackageManager::Conan },
            conan_outcome,
        );
    }

    let ali_outcome = ali::probe(component, ctx);
    apply_outcome(
        component,
        &mut package_manager_set,
        &mut warnings,
        "ada",
        PackageManager::Gnat,
        ali_outcome,
    );

    if !package_manager_set {
        let generic_outcome = generic::probe(raw_bytes, component);
        apply_outcome(
            component,
            &mut package_manager_set,
            &mut warnings,
            "generic",
            PackageManager::Generic,
            generic_outcome,
        );
    }

    if !package_manager_set {
        component.package_manager = Some(PackageManager::Unknown);
    }

    if !warnings.is_empty() {
        component
            .properties
            .insert("attribution.warnings".to_string(), warnings.join("; "));
    }
}

fn looks_like_vcpkg(file_path: &str, _pkg_name: &str) -> bool {
    file_path.contains("vcpkg_installed") || file_path.contains("vcpkg")
}

fn apply_outcome(
    component: &mut ComponentInfo,
    package_manager_set: &mut bool,
    warnings: &mut Vec<String>,
    probe_name: &str,
    manager: PackageManager,
    outcome: ProbeOutcome,
) {
    match outcome {
        ProbeOutcome::NotApplicable => {}
        ProbeOutcome::Error(msg) => {
            warnings.push(format!("{probe_name}: {msg}"));
        }
        ProbeOutcome::Enriched(info) => {
            if !*package_manager_set {
                component.package_manager = Some(manager);
                *package_manager_set = true;
            }
            if component.version.is_none() {
                component.version = info.version;
            }
            if component.supplier.is_none() {
                component.supplier = info.supplier;
            }
            if component.license_declared.is_none() {
                component.license_declared = info.license;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unattributed_component_falls_back_to_unknown() {
        let mut component = ComponentInfo::new("mystery", "/nonexistent/path/mystery.so");
        let ctx = AttributorContext::default();
        run_attributors(&mut component, &ctx, b"no version-like strings");
        assert_eq!(component.package_manager, Some(PackageManager::Unknown));
    }
}
