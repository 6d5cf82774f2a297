//! SPDX 2.3 tag-value handler (§4.5 "SPDX 2.3 (tag-value)").

use heimdall_common::{ChecksumAlgorithm, ComponentInfo};

use crate::errors::DocumentError;
use crate::metadata::DocumentMetadata;
use crate::refs::{self, spdx_id};
use crate::{features, Handler, ValidationResult};

pub struct Spdx23Handler;

const NOASSERTION: &str = "NOASSERTION";

impl Handler for Spdx23Handler {
    fn name(&self) -> &'static str {
        "SPDX"
    }

    fn version(&self) -> &'static str {
        "2.3"
    }

    fn supports_feature(&self, tag: &str) -> bool {
        matches!(tag, features::RELATIONSHIPS | features::LICENSES_EXPRESSION)
    }

    fn generate(
        &self,
        components: &[ComponentInfo],
        metadata: &DocumentMetadata,
    ) -> Result<Vec<u8>, DocumentError> {
        let mut out = String::new();
        write_header(&mut out, metadata);

        let order = refs::stable_order(components, spdx_id);

        if let Some(&root_idx) = order.iter().find(|&&i| i == 0).or(order.first()) {
            out.push_str(&format!(
                "Relationship: SPDXRef-DOCUMENT DESCRIBES {}\n",
                spdx_id(&components[root_idx])
            ));
        }

        let dependency_refs = refs::resolve_dependency_refs(components, spdx_id);

        for &i in &order {
            write_package(&mut out, &components[i]);
        }

        // Containment and dependency relationships are written after every
        // `Package` block so a tag-value reader never has to look ahead
        // for a `SPDXID` a later block has not declared yet.
        for &i in &order {
            let component = &components[i];
            if let Some(parent_path) = refs::archive_member_parent(component) {
                if let Some(parent) = components.iter().find(|c| c.file_path == parent_path) {
                    out.push_str(&format!(
                        "Relationship: {} CONTAINS {}\n",
                        spdx_id(parent),
                        spdx_id(component)
                    ));
                }
            }
            for dep_ref in &dependency_refs[i] {
                out.push_str(&format!(
                    "Relationship: {} DEPENDS_ON {}\n",
                    spdx_id(component),
                    dep_ref
                ));
            }
        }

        Ok(out.into_bytes())
    }

    fn validate_content(&self, bytes: &[u8]) -> ValidationResult {
        let text = match std::str::from_utf8(bytes) {
            Ok(t) => t,
            Err(_) => return ValidationResult::invalid("document is not valid UTF-8"),
        };

        let mut errors = Vec::new();
        if !text.contains("SPDXVersion: SPDX-2.3") {
            errors.push("missing SPDXVersion: SPDX-2.3 header".to_string());
        }
        if !text.contains("DataLicense: CC0-1.0") {
            errors.push("missing DataLicense: CC0-1.0 header".to_string());
        }
        if !text.contains("SPDXID: SPDXRef-DOCUMENT") {
            errors.push("missing SPDXID: SPDXRef-DOCUMENT header".to_string());
        }
        if !text.contains("DOCUMENT DESCRIBES") && text.contains("PackageName:") {
            errors.push("no DOCUMENT DESCRIBES relationship for a non-empty component set".to_string());
        }

        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid { errors, warnings: Vec::new() }
        }
    }
}

fn write_header(out: &mut String, metadata: &DocumentMetadata) {
    out.push_str("SPDXVersion: SPDX-2.3\n");
    out.push_str("DataLicense: CC0-1.0\n");
    out.push_str("SPDXID: SPDXRef-DOCUMENT\n");
    out.push_str(&format!("DocumentName: {}\n", metadata.document_name));
    out.push_str(&format!(
        "DocumentNamespace: https://spdx.org/spdxdocs/{}-{}\n",
        heimdall_common::sanitize_identifier(&metadata.document_name),
        metadata.namespace_uuid
    ));
    out.push_str(&format!(
        "Creator: Tool: {}-{}\n",
        metadata.creator_tool_name, metadata.creator_tool_version
    ));
    out.push_str(&format!("Created: {}\n", metadata.timestamp_seconds()));
}

fn write_package(out: &mut String, component: &ComponentInfo) {
    let id = spdx_id(component);

    if let Some(parent_path) = refs::archive_member_parent(component) {
        out.push_str(&format!(
            "## Archive member of {parent_path}: PackageType=ObjectFile\n"
        ));
    }

    out.push_str(&format!("PackageName: {}\n", component.name));
    out.push_str(&format!("SPDXID: {id}\n"));
    out.push_str(&format!(
        "PackageVersion: {}\n",
        component.version.as_deref().unwrap_or(NOASSERTION)
    ));
    out.push_str(&format!("PackageFileName: {}\n", component.file_path));
    out.push_str(&format!(
        "PackageSupplier: {}\n",
        component
            .supplier
            .as_deref()
            .map(|s| format!("Organization: {s}"))
            .unwrap_or_else(|| NOASSERTION.to_string())
    ));
    out.push_str(&format!(
        "PackageDownloadLocation: {}\n",
        component.download_location.as_deref().unwrap_or(NOASSERTION)
    ));
    out.push_str("FilesAnalyzed: true\n");
    out.push_str(&format!(
        "PackageVerificationCode: {}\n",
        package_verification_code(component)
    ));
    if let Some(sha1) = component.checksums.get(&ChecksumAlgorithm::Sha1) {
        out.push_str(&format!("PackageChecksum: SHA1: {sha1}\n"));
    }
    if let Some(sha256) = component.checksums.get(&ChecksumAlgorithm::Sha256) {
        out.push_str(&format!("PackageChecksum: SHA256: {sha256}\n"));
    }
    out.push_str(&format!(
        "PackageHomePage: {}\n",
        component.homepage.as_deref().unwrap_or(NOASSERTION)
    ));
    out.push_str(&format!(
        "PackageLicenseConcluded: {}\n",
        component.license_concluded.as_deref().unwrap_or(NOASSERTION)
    ));
    out.push_str(&format!(
        "PackageLicenseDeclared: {}\n",
        component.license_declared.as_deref().unwrap_or(NOASSERTION)
    ));
    out.push_str("PackageCopyrightText: NOASSERTION\n");
}

/// §4.5 SPDX 2.3 `PackageVerificationCode` / P7: SHA-1 over the
/// newline-joined, lexicographically sorted SHA-1s of the component's
/// source files. Files that cannot be read (the common case — the binary
/// was built on another machine) are skipped rather than treated as an
/// error; an empty file list hashes to the well-known SHA-1 of the empty
/// string, same as a component with no recoverable source files at all.
fn package_verification_code(component: &ComponentInfo) -> String {
    let mut file_hashes: Vec<String> = component
        .source_files
        .iter()
        .filter_map(|path| std::fs::read(path).ok())
        .map(|data| heimdall_common::sha1_hex(&data))
        .collect();
    file_hashes.sort();

    let mut joined = String::new();
    for hash in &file_hashes {
        joined.push_str(hash);
        joined.push('\n');
    }
    heimdall_common::sha1_hex(joined.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use heimdall_common::FileType;

    fn sample_components() -> Vec<ComponentInfo> {
        let mut app = ComponentInfo::new("app", "/bin/app");
        app.checksums.insert(ChecksumAlgorithm::Sha1, "a".repeat(40));
        app.checksums.insert(ChecksumAlgorithm::Sha256, "b".repeat(64));
        app.file_type = FileType::Executable;
        app.dependencies = vec!["libfoo.a(foo.o)".to_string()];
        app.derive_identity_key();
        app.mark_processed();

        let mut member = ComponentInfo::new("foo.o", "/build/libfoo.a(foo.o)");
        member.checksums.insert(ChecksumAlgorithm::Sha1, "c".repeat(40));
        member.checksums.insert(ChecksumAlgorithm::Sha256, "d".repeat(64));
        member.file_type = FileType::ObjectFile;
        member.derive_identity_key();
        member.mark_processed();

        vec![app, member]
    }

    fn sample_metadata() -> DocumentMetadata {
        let created = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        DocumentMetadata::deterministic("test-doc", created)
    }

    #[test]
    fn header_matches_required_fields() {
        let out = Spdx23Handler.generate(&[], &sample_metadata()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("SPDXVersion: SPDX-2.3\n"));
        assert!(text.contains("DataLicense: CC0-1.0\n"));
        assert!(text.contains("SPDXID: SPDXRef-DOCUMENT\n"));
        assert!(text.contains("Created: 2024-01-01T00:00:00Z\n"));
    }

    #[test]
    fn describes_relationship_points_at_root_and_validates() {
        let components = sample_components();
        let out = Spdx23Handler.generate(&components, &sample_metadata()).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains(&format!(
            "Relationship: SPDXRef-DOCUMENT DESCRIBES {}",
            spdx_id(&components[0])
        )));
        assert!(Spdx23Handler.validate_content(&out).is_valid());
    }

    #[test]
    fn package_verification_code_is_deterministic_and_recomputable() {
        let component = &sample_components()[0];
        let a = package_verification_code(component);
        let b = package_verification_code(component);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn empty_component_set_is_still_valid() {
        let out = Spdx23Handler.generate(&[], &sample_metadata()).unwrap();
        assert!(Spdx23Handler.validate_content(&out).is_valid());
    }
}
