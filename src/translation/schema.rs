// JSON Schema adaptation for the Gemini function-declaration subset
//
// Gemini rejects a number of JSON Schema keywords that Claude clients send
// freely. Instead of dropping them silently, every removed constraint is
// folded into the node's `description` under a single technical marker, so
// the model still sees the intent and the original constraint stays
// recoverable from the description text.

use phf::phf_map;
use serde_json::{Map, Value};
use tracing::debug;

/// Marker prefix for the aggregated removed-constraint note.
pub const TECH_MARKER: &str = "[Technical info - removed for Gemini compatibility: ";

/// `format` values Gemini accepts; everything else is replaced by a hint.
const ALLOWED_FORMATS: &[&str] = &["enum", "date-time"];

/// Keywords removed unconditionally, value preserved as a description hint.
const REMOVED_KEYS: &[&str] = &[
    "$schema",
    "additionalProperties",
    "patternProperties",
    "dependencies",
    "contentEncoding",
    "contentMediaType",
    "examples",
    "default",
    "readOnly",
    "writeOnly",
    "deprecated",
];

/// Hints for well-known string formats.
static FORMAT_HINTS: phf::Map<&'static str, &'static str> = phf_map! {
    "url" => "Expected: valid URL format (e.g., https://example.com)",
    "uri" => "Expected: valid URI format",
    "email" => "Expected: valid email format (e.g., user@example.com)",
    "hostname" => "Expected: valid hostname format",
    "ipv4" => "Expected: valid IPv4 address format (e.g., 192.168.1.1)",
    "ipv6" => "Expected: valid IPv6 address format",
    "uuid" => "Expected: valid UUID format (e.g., 123e4567-e89b-12d3-a456-426614174000)",
    "date" => "Expected: valid date format (YYYY-MM-DD)",
    "time" => "Expected: valid time format (HH:MM:SS)",
    "regex" => "Expected: valid regular expression pattern",
    "json-pointer" => "Expected: valid JSON pointer format",
    "relative-json-pointer" => "Expected: valid relative JSON pointer format",
    "binary" => "Expected: binary data format",
    "byte" => "Expected: base64-encoded binary data",
    "password" => "Expected: password string",
};

/// Adapt a tool-parameter JSON Schema to the subset Gemini accepts.
///
/// Pure and total: malformed input is passed through untouched where it
/// cannot be interpreted, and re-applying `adapt` to its own output is a
/// no-op (the marker check prevents description growth).
pub fn adapt(schema: Value) -> Value {
    let adapted = adapt_node(schema);
    // Closing sweep: anything a future keyword combination might leave behind
    // is stripped here without hints.
    deep_clean(adapted, false)
}

fn adapt_node(value: Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };

    // Recurse before cleaning the node itself
    if let Some(Value::Object(props)) = map.get_mut("properties") {
        let keys: Vec<String> = props.keys().cloned().collect();
        for key in keys {
            if let Some(child) = props.remove(&key) {
                props.insert(key, adapt_node(child));
            }
        }
    }
    if let Some(items) = map.remove("items") {
        let adapted_items = match items {
            Value::Array(list) => Value::Array(list.into_iter().map(adapt_node).collect()),
            single => adapt_node(single),
        };
        map.insert("items".to_string(), adapted_items);
    }
    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(list)) = map.remove(key) {
            map.insert(
                key.to_string(),
                Value::Array(list.into_iter().map(adapt_node).collect()),
            );
        }
    }

    let mut hints: Vec<String> = Vec::new();

    clean_format(&mut map, &mut hints);
    convert_exclusive_bound(&mut map, "exclusiveMinimum", "minimum", 1, &mut hints);
    convert_exclusive_bound(&mut map, "exclusiveMaximum", "maximum", -1, &mut hints);

    if let Some(value) = map.remove("multipleOf") {
        hints.push(format!("multipleOf: {} (value must be a multiple of it)", value));
    }
    if let Some(value) = map.remove("const") {
        hints.push(format!("const: {} (value must be exactly this)", value));
    }

    for key in REMOVED_KEYS {
        if let Some(value) = map.remove(*key) {
            hints.push(format!("{}: {}", key, value));
        }
    }

    if !hints.is_empty() {
        debug!(removed = hints.len(), "folded unsupported schema keywords into description");
        append_hints(&mut map, &hints);
    }

    Value::Object(map)
}

/// Remove disallowed `format` values, hinting at the expectation instead.
fn clean_format(map: &mut Map<String, Value>, hints: &mut Vec<String>) {
    let format = match map.get("format") {
        Some(Value::String(s)) if !ALLOWED_FORMATS.contains(&s.as_str()) => s.clone(),
        _ => return,
    };
    map.remove("format");

    let hint = FORMAT_HINTS
        .get(format.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Expected: `{}` format", format));
    hints.push(format!("format: {} ({})", format, hint));
}

/// Convert `exclusiveMinimum`/`exclusiveMaximum` to their inclusive forms.
///
/// Integer bounds shift by one; float bounds are copied through unchanged
/// since no safe increment exists.
fn convert_exclusive_bound(
    map: &mut Map<String, Value>,
    exclusive_key: &str,
    inclusive_key: &str,
    step: i64,
    hints: &mut Vec<String>,
) {
    let Some(value) = map.remove(exclusive_key) else {
        return;
    };

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                let shifted = i + step;
                map.insert(inclusive_key.to_string(), Value::from(shifted));
                hints.push(format!("{}: {} -> {}: {}", exclusive_key, i, inclusive_key, shifted));
            } else {
                // Float: copy the bound through
                let f = n.as_f64().unwrap_or(0.0);
                map.insert(inclusive_key.to_string(), Value::from(f));
                hints.push(format!("{}: {} -> {}: {}", exclusive_key, f, inclusive_key, f));
            }
        }
        other => {
            hints.push(format!("{}: {}", exclusive_key, other));
        }
    }
}

/// Append the aggregated hint block to this node's description, once.
fn append_hints(map: &mut Map<String, Value>, hints: &[String]) {
    let block = format!("{}{}]", TECH_MARKER, hints.join("; "));

    let description = map
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    // Idempotence guard: never append the same note twice
    if description.contains(&block) {
        return;
    }

    let combined = if description.is_empty() {
        block
    } else {
        format!("{}\n\n{}", description, block)
    };
    map.insert("description".to_string(), Value::String(combined));
}

/// Final defensive sweep removing any disallowed key the per-node pass could
/// have missed. `in_property_map` tracks whether the current object's keys
/// are property names (which may legitimately be called "default" etc.).
fn deep_clean(value: Value, in_property_map: bool) -> Value {
    match value {
        Value::Object(mut map) => {
            if !in_property_map {
                map.retain(|key, _| {
                    !REMOVED_KEYS.contains(&key.as_str())
                        && !matches!(
                            key.as_str(),
                            "exclusiveMinimum" | "exclusiveMaximum" | "multipleOf" | "const"
                        )
                });
                if let Some(Value::String(format)) = map.get("format") {
                    if !ALLOWED_FORMATS.contains(&format.as_str()) {
                        map.remove("format");
                    }
                }
            }

            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let child_is_property_map = !in_property_map && key == "properties";
                if let Some(child) = map.remove(&key) {
                    map.insert(key, deep_clean(child, child_is_property_map));
                }
            }
            Value::Object(map)
        }
        Value::Array(list) => Value::Array(
            list.into_iter()
                .map(|item| deep_clean(item, false))
                .collect(),
        ),
        other => other,
    }
}

/// Read-only diagnostic: list any disallowed keyword or format still present
/// in an adapted tree. Never mutates; used only for logging.
pub fn check_adapted(schema: &Value) -> Vec<String> {
    let mut found = Vec::new();
    check_node(schema, "", false, &mut found);
    found
}

fn check_node(value: &Value, path: &str, in_property_map: bool, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let current = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };

                if !in_property_map {
                    let disallowed = REMOVED_KEYS.contains(&key.as_str())
                        || matches!(
                            key.as_str(),
                            "exclusiveMinimum" | "exclusiveMaximum" | "multipleOf" | "const"
                        );
                    if disallowed {
                        found.push(current.clone());
                    }
                    if key == "format" {
                        if let Some(format) = child.as_str() {
                            if !ALLOWED_FORMATS.contains(&format) {
                                found.push(format!("{} (unsupported format: {})", current, format));
                            }
                        }
                    }
                }

                let child_is_property_map = !in_property_map && key == "properties";
                check_node(child, &current, child_is_property_map, found);
            }
        }
        Value::Array(list) => {
            for (i, item) in list.iter().enumerate() {
                check_node(item, &format!("{}[{}]", path, i), false, found);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_removed_keys_are_gone_and_hinted() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "name": { "type": "string" }
            }
        });

        let adapted = adapt(schema);

        assert!(adapted.get("$schema").is_none());
        assert!(adapted.get("additionalProperties").is_none());
        let description = adapted["description"].as_str().unwrap();
        assert!(description.contains("$schema"));
        assert!(description.contains("additionalProperties: false"));
        assert!(description.contains(TECH_MARKER));
    }

    #[test]
    fn test_exclusive_minimum_integer_conversion() {
        let adapted = adapt(json!({"type": "integer", "exclusiveMinimum": 5}));
        assert_eq!(adapted["minimum"], json!(6));
        assert!(adapted.get("exclusiveMinimum").is_none());
    }

    #[test]
    fn test_exclusive_maximum_integer_conversion() {
        let adapted = adapt(json!({"type": "integer", "exclusiveMaximum": 10}));
        assert_eq!(adapted["maximum"], json!(9));
    }

    #[test]
    fn test_exclusive_bound_float_copied_through() {
        let adapted = adapt(json!({"type": "number", "exclusiveMinimum": 1.5}));
        assert_eq!(adapted["minimum"], json!(1.5));
        let description = adapted["description"].as_str().unwrap();
        assert!(description.contains("exclusiveMinimum"));
    }

    #[test]
    fn test_format_replacement_with_hint() {
        let adapted = adapt(json!({"type": "string", "format": "email"}));
        assert!(adapted.get("format").is_none());
        let description = adapted["description"].as_str().unwrap();
        assert!(description.contains("format: email"));
        assert!(description.contains("user@example.com"));
    }

    #[test]
    fn test_unknown_format_gets_generic_hint() {
        let adapted = adapt(json!({"type": "string", "format": "isbn"}));
        let description = adapted["description"].as_str().unwrap();
        assert!(description.contains("Expected: `isbn` format"));
    }

    #[test]
    fn test_allowed_formats_kept() {
        let adapted = adapt(json!({"type": "string", "format": "date-time"}));
        assert_eq!(adapted["format"], json!("date-time"));
    }

    #[test]
    fn test_nested_recursion() {
        let schema = json!({
            "type": "object",
            "properties": {
                "inner": {
                    "type": "object",
                    "default": {"a": 1},
                    "properties": {
                        "leaf": {"type": "string", "format": "uuid"}
                    }
                }
            },
            "items": {"type": "string", "format": "uri"},
            "anyOf": [
                {"type": "number", "exclusiveMinimum": 0}
            ]
        });

        let adapted = adapt(schema);

        let inner = &adapted["properties"]["inner"];
        assert!(inner.get("default").is_none());
        assert!(inner["properties"]["leaf"].get("format").is_none());
        assert!(adapted["items"].get("format").is_none());
        assert_eq!(adapted["anyOf"][0]["minimum"], json!(1));
    }

    #[test]
    fn test_property_named_like_keyword_survives() {
        let schema = json!({
            "type": "object",
            "properties": {
                "default": {"type": "string"},
                "const": {"type": "number"}
            }
        });

        let adapted = adapt(schema);
        assert!(adapted["properties"].get("default").is_some());
        assert!(adapted["properties"].get("const").is_some());
    }

    #[test]
    fn test_idempotence_no_marker_duplication() {
        let schema = json!({
            "type": "string",
            "format": "email",
            "description": "An address"
        });

        let once = adapt(schema);
        let twice = adapt(once.clone());

        assert_eq!(once, twice);
        let description = twice["description"].as_str().unwrap();
        assert_eq!(description.matches(TECH_MARKER).count(), 1);
    }

    #[test]
    fn test_checker_reports_residual_keywords() {
        let dirty = json!({
            "type": "object",
            "examples": [1, 2],
            "properties": {
                "x": {"type": "string", "format": "url"}
            }
        });

        let issues = check_adapted(&dirty);
        assert!(issues.iter().any(|i| i.contains("examples")));
        assert!(issues.iter().any(|i| i.contains("unsupported format: url")));

        let clean = adapt(dirty);
        assert!(check_adapted(&clean).is_empty());
    }

    #[test]
    fn test_non_object_input_passthrough() {
        assert_eq!(adapt(json!("just a string")), json!("just a string"));
        assert_eq!(adapt(json!(null)), json!(null));
    }
}
