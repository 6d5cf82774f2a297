//! Walks a JSON tree removing every field named exactly `signature`,
//! recording each removed location as a JSON pointer (§4.5.1 step 2).

use serde_json::Value;

/// Removes every `signature` field at any depth of `value`, returning the
/// JSON-pointer path of each one removed, sorted lexicographically as the
/// spec requires for the `excludes` list.
pub fn remove_signature_fields(value: &mut Value) -> Vec<String> {
    let mut removed = Vec::new();
    walk(value, String::new(), &mut removed);
    removed.sort();
    removed
}

fn walk(value: &mut Value, path: String, removed: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if map.remove("signature").is_some() {
                removed.push(format!("{path}/signature"));
            }
            for (key, child) in map.iter_mut() {
                let child_path = format!("{path}/{}", escape_pointer_segment(key));
                walk(child, child_path, removed);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                walk(item, format!("{path}/{i}"), removed);
            }
        }
        _ => {}
    }
}

/// RFC 6901 JSON-pointer escaping: `~` -> `~0`, `/` -> `~1`.
fn escape_pointer_segment(segment: &str) -> String {
    if segment.contains(['~', '/']) {
        segment.replace('~', "~0").replace('/', "~1")
    } else {
        segment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_top_level_signature() {
        let mut doc = json!({"bomFormat": "CycloneDX", "signature": {"algorithm": "RS256"}});
        let removed = remove_signature_fields(&mut doc);
        assert_eq!(removed, vec!["/signature".to_string()]);
        assert!(doc.get("signature").is_none());
    }

    #[test]
    fn removes_nested_signatures_and_sorts_paths() {
        let mut doc = json!({
            "signature": {"algorithm": "RS256"},
            "components": [
                {"name": "a", "signature": {"algorithm": "RS256"}},
            ],
        });
        let removed = remove_signature_fields(&mut doc);
        assert_eq!(removed, vec!["/components/0/signature".to_string(), "/signature".to_string()]);
    }
}
