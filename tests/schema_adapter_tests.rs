// Property tests for the JSON Schema adapter

use claude2gemini::translation::schema::{adapt, check_adapted};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Generator for small schema-like JSON trees mixing allowed and disallowed
/// keywords.
fn arb_schema() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(json!({"type": "string"})),
        Just(json!({"type": "string", "format": "email"})),
        Just(json!({"type": "string", "format": "date-time"})),
        Just(json!({"type": "integer", "exclusiveMinimum": 5})),
        Just(json!({"type": "number", "exclusiveMaximum": 2.5})),
        Just(json!({"type": "integer", "multipleOf": 3})),
        Just(json!({"type": "boolean", "default": true})),
        Just(json!({"const": "fixed"})),
        Just(json!({"type": "string", "examples": ["a", "b"]})),
    ];

    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..3).prop_map(|items| json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "a": items[0].clone(),
                    "b": items.get(1).cloned().unwrap_or(json!({"type": "null"}))
                }
            })),
            inner.clone().prop_map(|item| json!({
                "type": "array",
                "items": item
            })),
            prop::collection::vec(inner, 1..3)
                .prop_map(|variants| json!({ "anyOf": variants })),
        ]
    })
}

proptest! {
    #[test]
    fn adapted_schemas_are_clean(schema in arb_schema()) {
        let adapted = adapt(schema);
        prop_assert!(check_adapted(&adapted).is_empty());
    }

    #[test]
    fn adapt_is_idempotent(schema in arb_schema()) {
        let once = adapt(schema);
        let twice = adapt(once.clone());
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn removed_keyword_values_survive_in_descriptions() {
    let schema = json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "limit": {"type": "integer", "multipleOf": 7},
            "mode": {"const": "fast"}
        }
    });

    let adapted = adapt(schema);
    let text = serde_json::to_string(&adapted).unwrap();

    // keyword names and their values are recoverable from description text
    assert!(text.contains("additionalProperties"));
    assert!(text.contains("multipleOf"));
    assert!(text.contains('7'));
    assert!(text.contains("const"));
    assert!(text.contains("fast"));
}

#[test]
fn exclusivity_conversion_integer_and_float() {
    let adapted = adapt(json!({
        "type": "object",
        "properties": {
            "int_bound": {"type": "integer", "exclusiveMinimum": 5},
            "float_bound": {"type": "number", "exclusiveMaximum": 9.5}
        }
    }));

    assert_eq!(adapted["properties"]["int_bound"]["minimum"], json!(6));
    assert_eq!(adapted["properties"]["float_bound"]["maximum"], json!(9.5));
    assert!(check_adapted(&adapted).is_empty());
}
