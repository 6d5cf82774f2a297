//! CycloneDX 1.4/1.5/1.6 JSON handler (§4.5 "CycloneDX 1.4/1.5/1.6").
//!
//! One handler covers all three versions: the schema differences between
//! them are additive (evidence in 1.5+, signing in 1.6+), so gating on
//! `self.version` inside one `generate` reads closer to how the source
//! system's own per-version emitters differ — mostly in which optional
//! blocks they populate — than three near-duplicate handlers would.

use heimdall_common::{ChecksumAlgorithm, ComponentInfo};
use serde_json::{json, Map, Value};

use crate::errors::DocumentError;
use crate::metadata::DocumentMetadata;
use crate::refs::{self, bom_ref};
use crate::{features, Handler, ValidationResult};

pub struct CycloneDxHandler {
    version: &'static str,
}

impl CycloneDxHandler {
    pub fn new(version: &'static str) -> Self {
        CycloneDxHandler { version }
    }
}

impl Handler for CycloneDxHandler {
    fn name(&self) -> &'static str {
        "CycloneDX"
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn supports_feature(&self, tag: &str) -> bool {
        match tag {
            features::SIGNING => self.version == "1.6",
            features::EVIDENCE => self.version != "1.4",
            features::PROPERTIES | features::LICENSES_EXPRESSION | features::RELATIONSHIPS => true,
            _ => false,
        }
    }

    fn generate(
        &self,
        components: &[ComponentInfo],
        metadata: &DocumentMetadata,
    ) -> Result<Vec<u8>, DocumentError> {
        let order = refs::stable_order(components, bom_ref);
        let dependency_refs = refs::resolve_dependency_refs(components, bom_ref);

        let component_nodes: Vec<Value> = order.iter().map(|&i| self.component_node(&components[i])).collect();

        let dependency_nodes: Vec<Value> = order
            .iter()
            .map(|&i| {
                json!({
                    "ref": bom_ref(&components[i]),
                    "dependsOn": dependency_refs[i],
                })
            })
            .collect();

        let document = json!({
            "bomFormat": "CycloneDX",
            "specVersion": self.version,
            "version": 1,
            "serialNumber": format!("urn:uuid:{}", metadata.serial_uuid),
            "metadata": {
                "timestamp": metadata.timestamp_millis(),
                "tools": cyclonedx_tools(self.version, metadata),
                "component": {
                    "type": "application",
                    "name": metadata.document_name,
                },
            },
            "components": component_nodes,
            "dependencies": dependency_nodes,
        });

        serde_json::to_vec_pretty(&document).map_err(DocumentError::from)
    }

    fn validate_content(&self, bytes: &[u8]) -> ValidationResult {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(v) => v,
            Err(e) => return ValidationResult::invalid(format!("invalid JSON: {e}")),
        };

        let mut errors = Vec::new();
        if value.get("bomFormat").and_then(Value::as_str) != Some("CycloneDX") {
            errors.push("bomFormat must be \"CycloneDX\"".to_string());
        }
        if value.get("specVersion").and_then(Value::as_str) != Some(self.version) {
            errors.push(format!("specVersion must be \"{}\"", self.version));
        }
        let Some(serial) = value.get("serialNumber").and_then(Value::as_str) else {
            errors.push("missing serialNumber".to_string());
            return finish(errors);
        };
        if !serial.starts_with("urn:uuid:") {
            errors.push("serialNumber must be a urn:uuid: URI".to_string());
        }

        let refs: Vec<String> = value["components"]
            .as_array()
            .map(|a| a.iter().filter_map(|c| c["bom-ref"].as_str().map(String::from)).collect())
            .unwrap_or_default();
        if let Some(deps) = value["dependencies"].as_array() {
            for dep in deps {
                let depends_on = dep["dependsOn"].as_array().cloned().unwrap_or_default();
                for target in depends_on {
                    if let Some(target) = target.as_str() {
                        if !refs.iter().any(|r| r == target) {
                            errors.push(format!("dependsOn target {target:?} has no matching component"));
                        }
                    }
                }
            }
        }

        finish(errors)
    }
}

fn finish(errors: Vec<String>) -> ValidationResult {
    if errors.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid { errors, warnings: Vec::new() }
    }
}

fn cyclonedx_tools(version: &str, metadata: &DocumentMetadata) -> Value {
    let tool = json!({
        "vendor": "Heimdall Authors",
        "name": metadata.creator_tool_name,
        "version": metadata.creator_tool_version,
    });
    // 1.4 uses the flat `tools` array; 1.5+ additionally supports the
    // `{components: [...]}` shape, but the flat array remains valid
    // across every version this handler emits, so there is no need to
    // branch on `version` here beyond documenting why not.
    let _ = version;
    json!([tool])
}

impl CycloneDxHandler {
    fn component_node(&self, component: &ComponentInfo) -> Value {
        let mut node = Map::new();
        node.insert("bom-ref".to_string(), json!(bom_ref(component)));
        node.insert("type".to_string(), json!(cyclonedx_type(component)));
        node.insert("name".to_string(), json!(component.name));
        if let Some(version) = &component.version {
            node.insert("version".to_string(), json!(version));
        }
        if let Some(purl) = derive_purl(component) {
            node.insert("purl".to_string(), json!(purl));
        }

        let mut hashes = Vec::new();
        if let Some(sha256) = component.checksums.get(&ChecksumAlgorithm::Sha256) {
            hashes.push(json!({"alg": "SHA-256", "content": sha256}));
        }
        if let Some(sha1) = component.checksums.get(&ChecksumAlgorithm::Sha1) {
            hashes.push(json!({"alg": "SHA-1", "content": sha1}));
        }
        if !hashes.is_empty() {
            node.insert("hashes".to_string(), Value::Array(hashes));
        }

        if let Some(license) = &component.license_declared {
            node.insert(
                "licenses".to_string(),
                json!([{"license": {"id": license}}]),
            );
        }

        if self.version != "1.4" && component.was_processed {
            node.insert(
                "evidence".to_string(),
                json!({
                    "identity": {
                        "field": "purl",
                        "confidence": if component.package_manager.is_some() { 1.0 } else { 0.5 },
                    },
                }),
            );
        }

        let mut properties = vec![
            json!({"name": "heimdall:file_path", "value": component.file_path}),
            json!({"name": "heimdall:was_processed", "value": component.was_processed.to_string()}),
            json!({"name": "heimdall:contains_debug_info", "value": component.contains_debug_info.to_string()}),
        ];
        if let Some(err) = &component.processing_error {
            properties.push(json!({"name": "heimdall:processing_error", "value": err}));
        }
        for (key, value) in &component.properties {
            properties.push(json!({"name": format!("heimdall:{key}"), "value": value}));
        }
        node.insert("properties".to_string(), Value::Array(properties));

        Value::Object(node)
    }
}

fn cyclonedx_type(component: &ComponentInfo) -> &'static str {
    use heimdall_common::FileType;
    match component.file_type {
        FileType::Executable => "application",
        FileType::SourceFile => "file",
        FileType::SharedLibrary | FileType::StaticArchive | FileType::ObjectFile | FileType::Unknown => "library",
    }
}

/// Best-effort `purl` derivation (§4.5: "`purl` if derivable"; SPEC_FULL
/// supplemental feature: ecosystem inferred from `package_manager`).
fn derive_purl(component: &ComponentInfo) -> Option<String> {
    let ecosystem = component.package_manager?.purl_ecosystem()?;
    let version = component.version.as_deref();
    Some(match version {
        Some(v) => format!("pkg:{ecosystem}/{}@{v}", component.name),
        None => format!("pkg:{ecosystem}/{}", component.name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use heimdall_common::{FileType, PackageManager};

    fn sample_metadata() -> DocumentMetadata {
        let created = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        DocumentMetadata::deterministic("test-doc", created)
    }

    fn app_and_archive_member() -> Vec<ComponentInfo> {
        let mut app = ComponentInfo::new("app", "/bin/app");
        app.checksums.insert(ChecksumAlgorithm::Sha256, "a".repeat(64));
        app.file_type = FileType::Executable;
        app.dependencies = vec!["libfoo.a(foo.o)".to_string()];
        app.derive_identity_key();
        app.mark_processed();

        let mut member = ComponentInfo::new("foo.o", "/build/libfoo.a(foo.o)");
        member.checksums.insert(ChecksumAlgorithm::Sha256, "b".repeat(64));
        member.file_type = FileType::ObjectFile;
        member.derive_identity_key();
        member.mark_processed();

        vec![app, member]
    }

    #[test]
    fn top_level_shape_matches_s1() {
        let handler = CycloneDxHandler::new("1.6");
        let components = app_and_archive_member();
        let bytes = handler.generate(&components, &sample_metadata()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["bomFormat"], "CycloneDX");
        assert_eq!(value["specVersion"], "1.6");
        let deps = value["dependencies"].as_array().unwrap();
        let app_ref = bom_ref(&components[0]);
        let member_ref = bom_ref(&components[1]);
        let app_entry = deps.iter().find(|d| d["ref"] == app_ref).unwrap();
        assert_eq!(app_entry["dependsOn"], json!([member_ref]));
        assert!(handler.validate_content(&bytes).is_valid());
    }

    #[test]
    fn components_are_sorted_by_bom_ref_regardless_of_input_order() {
        let handler = CycloneDxHandler::new("1.6");
        let forward = app_and_archive_member();
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = handler.generate(&forward, &sample_metadata()).unwrap();
        let b = handler.generate(&reversed, &sample_metadata()).unwrap();
        assert_eq!(a, b, "P8: reordering input paths must not change output bytes");
    }

    #[test]
    fn purl_derivation_uses_package_manager_ecosystem() {
        let mut c = ComponentInfo::new("libssl", "/usr/lib/libssl.so");
        c.checksums.insert(ChecksumAlgorithm::Sha256, "c".repeat(64));
        c.package_manager = Some(PackageManager::System);
        c.version = Some("1.1.1".to_string());
        assert_eq!(derive_purl(&c).as_deref(), Some("pkg:deb/libssl@1.1.1"));
    }

    #[test]
    fn evidence_is_gated_per_version() {
        let components = app_and_archive_member();
        let v14 = CycloneDxHandler::new("1.4").generate(&components, &sample_metadata()).unwrap();
        let v15 = CycloneDxHandler::new("1.5").generate(&components, &sample_metadata()).unwrap();
        let v14: Value = serde_json::from_slice(&v14).unwrap();
        let v15: Value = serde_json::from_slice(&v15).unwrap();
        assert!(v14["components"][0].get("evidence").is_none());
        assert!(v15["components"][0].get("evidence").is_some());
    }
}
