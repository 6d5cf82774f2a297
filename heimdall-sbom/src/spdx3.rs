//! SPDX 3.0 / 3.0.1 JSON-LD handler (§4.5 "SPDX 3.0 / 3.0.1 (JSON-LD)").
//!
//! The official SPDX 3.0.x JSON-LD schema is, per the source system's own
//! documentation, too narrow to carry most of what this tool extracts
//! from a binary — so emission is gated by `metadata.strict_schema`
//! (§4.5, §9 Open Questions): the permissive default keeps files,
//! packages and relationships as first-class `@graph` nodes; the strict
//! mode collapses everything but the bare `SpdxDocument` node into
//! `properties[]` extension entries so the document still validates
//! against the upstream schema.

use heimdall_common::{ChecksumAlgorithm, ComponentInfo};
use serde_json::{json, Map, Value};

use crate::errors::DocumentError;
use crate::metadata::DocumentMetadata;
use crate::refs::{self, spdx_id};
use crate::{features, Handler, ValidationResult};

pub struct Spdx3Handler {
    version: &'static str,
}

impl Spdx3Handler {
    pub fn new(version: &'static str) -> Self {
        Spdx3Handler { version }
    }

    fn context_url(&self) -> String {
        format!("https://spdx.org/rdf/{}/spdx-context.jsonld", self.version)
    }
}

impl Handler for Spdx3Handler {
    fn name(&self) -> &'static str {
        "SPDX"
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn supports_feature(&self, tag: &str) -> bool {
        matches!(
            tag,
            features::RELATIONSHIPS | features::LICENSES_EXPRESSION | features::PROPERTIES
        )
    }

    fn generate(
        &self,
        components: &[ComponentInfo],
        metadata: &DocumentMetadata,
    ) -> Result<Vec<u8>, DocumentError> {
        let document_id = format!(
            "https://spdx.org/spdxdocs/{}-{}",
            heimdall_common::sanitize_identifier(&metadata.document_name),
            metadata.namespace_uuid
        );

        let mut graph = Vec::new();
        let order = refs::stable_order(components, spdx_id);
        let element_ids: Vec<String> = order.iter().map(|&i| spdx_id(&components[i])).collect();

        graph.push(document_root(&document_id, metadata, &element_ids));

        if metadata.strict_schema {
            // Strict mode: the full component set is preserved as opaque
            // extension data on the document node rather than as graph
            // elements the schema does not recognize (§4.5 "attach full
            // data under `properties[]` extension points").
            if let Some(Value::Object(root)) = graph.get_mut(0) {
                root.insert(
                    "properties".to_string(),
                    json!(order
                        .iter()
                        .map(|&i| component_as_property(&components[i]))
                        .collect::<Vec<_>>()),
                );
            }
        } else {
            for &i in &order {
                graph.push(package_node(&components[i]));
            }
            let dependency_refs = refs::resolve_dependency_refs(components, spdx_id);
            for &i in &order {
                for dep_ref in &dependency_refs[i] {
                    graph.push(relationship_node(&spdx_id(&components[i]), "dependsOn", dep_ref));
                }
                if let Some(parent_path) = refs::archive_member_parent(&components[i]) {
                    if let Some(parent) = components.iter().find(|c| c.file_path == parent_path) {
                        graph.push(relationship_node(&spdx_id(parent), "contains", &spdx_id(&components[i])));
                    }
                }
            }
        }

        let document = json!({
            "@context": self.context_url(),
            "@graph": graph,
        });

        serde_json::to_vec_pretty(&document).map_err(DocumentError::from)
    }

    fn validate_content(&self, bytes: &[u8]) -> ValidationResult {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(v) => v,
            Err(e) => return ValidationResult::invalid(format!("invalid JSON: {e}")),
        };

        let mut errors = Vec::new();
        if value.get("@context").is_none() {
            errors.push("missing @context".to_string());
        }
        match value.get("@graph") {
            None => errors.push("missing @graph".to_string()),
            Some(Value::Array(graph)) if graph.is_empty() => {
                errors.push("@graph must contain at least the SpdxDocument root".to_string())
            }
            Some(Value::Array(graph)) => {
                let has_root = graph
                    .iter()
                    .any(|n| n.get("type").and_then(Value::as_str) == Some("SpdxDocument"));
                if !has_root {
                    errors.push("no SpdxDocument root node in @graph".to_string());
                }
            }
            Some(_) => errors.push("@graph must be an array".to_string()),
        }

        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid { errors, warnings: Vec::new() }
        }
    }
}

fn document_root(document_id: &str, metadata: &DocumentMetadata, elements: &[String]) -> Value {
    json!({
        "spdxId": document_id,
        "type": "SpdxDocument",
        "name": metadata.document_name,
        "creationInfo": {
            "created": metadata.timestamp_seconds(),
            "createdBy": [format!("{}-{}", metadata.creator_tool_name, metadata.creator_tool_version)],
        },
        "dataLicense": "CC0-1.0",
        "element": elements,
    })
}

fn package_node(component: &ComponentInfo) -> Value {
    let mut node = Map::new();
    node.insert("spdxId".to_string(), json!(spdx_id(component)));
    node.insert("type".to_string(), json!("software_Package"));
    node.insert("name".to_string(), json!(component.name));
    if let Some(version) = &component.version {
        node.insert("software_packageVersion".to_string(), json!(version));
    }
    if let Some(sha256) = component.checksums.get(&ChecksumAlgorithm::Sha256) {
        node.insert(
            "verifiedUsing".to_string(),
            json!([{"algorithm": "sha256", "hashValue": sha256}]),
        );
    }
    node.insert(
        "software_downloadLocation".to_string(),
        json!(component.download_location.clone().unwrap_or_else(|| "NOASSERTION".to_string())),
    );
    if let Some(declared) = &component.license_declared {
        node.insert("software_declaredLicense".to_string(), json!(declared));
    }
    Value::Object(node)
}

fn relationship_node(from: &str, relationship_type: &str, to: &str) -> Value {
    json!({
        "type": "Relationship",
        "from": from,
        "relationshipType": relationship_type,
        "to": [to],
    })
}

/// The full-fidelity form of a component, used as one `properties[]`
/// entry when `strict_schema` is enabled.
fn component_as_property(component: &ComponentInfo) -> Value {
    json!({
        "propertyName": "heimdall:component",
        "propertyValue": {
            "name": component.name,
            "filePath": component.file_path,
            "version": component.version,
            "checksums": component.checksums.iter().map(|(k, v)| (k.name(), v.clone())).collect::<std::collections::BTreeMap<_, _>>(),
            "dependencies": component.dependencies,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use heimdall_common::FileType;

    fn sample_metadata(strict: bool) -> DocumentMetadata {
        let created = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut m = DocumentMetadata::deterministic("test-doc", created);
        m.strict_schema = strict;
        m
    }

    fn one_component() -> Vec<ComponentInfo> {
        let mut c = ComponentInfo::new("app", "/bin/app");
        c.checksums.insert(ChecksumAlgorithm::Sha256, "a".repeat(64));
        c.file_type = FileType::Executable;
        c.derive_identity_key();
        c.mark_processed();
        vec![c]
    }

    #[test]
    fn permissive_mode_emits_package_nodes() {
        let handler = Spdx3Handler::new("3.0.1");
        let bytes = handler.generate(&one_component(), &sample_metadata(false)).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        let graph = value["@graph"].as_array().unwrap();
        assert!(graph.iter().any(|n| n["type"] == "software_Package"));
        assert!(handler.validate_content(&bytes).is_valid());
    }

    #[test]
    fn strict_mode_emits_only_document_root() {
        let handler = Spdx3Handler::new("3.0.1");
        let bytes = handler.generate(&one_component(), &sample_metadata(true)).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        let graph = value["@graph"].as_array().unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph[0]["type"], "SpdxDocument");
        assert!(graph[0]["properties"].as_array().unwrap().len() == 1);
        assert!(handler.validate_content(&bytes).is_valid());
    }

    #[test]
    fn empty_component_set_is_schema_minimal_and_valid() {
        let handler = Spdx3Handler::new("3.0");
        let bytes = handler.generate(&[], &sample_metadata(false)).unwrap();
        assert!(handler.validate_content(&bytes).is_valid());
    }
}
