//! Tests for `unevaluatedProperties` and `unevaluatedItems`.

use pretty_assertions::assert_eq;
use schemawalk::{Draft, JsonPointer, Options, SchemaBuilder};
use serde_json::json;

#[test]
fn test_properties_seen_through_all_of() {
    let schema = schemawalk::build(&json!({
        "properties": {"a": true},
        "allOf": [{"properties": {"b": true}}],
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"a": 1, "b": 2})));

    let report = schema.validate_report(&json!({"a": 1, "c": 3}), &JsonPointer::root());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].message, "unevaluated property 'c' is not allowed");
    assert_eq!(report.errors[0].instance_location.to_string(), "/c");
}

#[test]
fn test_only_valid_any_of_branches_claim() {
    let schema = schemawalk::build(&json!({
        "anyOf": [
            {"properties": {"a": true}, "required": ["a"]},
            {"properties": {"b": true}, "required": ["b"]}
        ],
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"a": 1})));
    assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
    assert!(!schema.is_valid(&json!({"a": 1, "c": 3})));
}

#[test]
fn test_failed_one_of_branch_does_not_claim() {
    let schema = schemawalk::build(&json!({
        "oneOf": [
            {"properties": {"a": {"type": "string"}}},
            {"properties": {"a": {"type": "integer"}, "b": true}, "required": ["b"]}
        ],
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
    assert!(!schema.is_valid(&json!({"a": "x", "b": 2})));
}

#[test]
fn test_conditional_branch_claims() {
    let schema = schemawalk::build(&json!({
        "if": {"properties": {"kind": {"const": "x"}}, "required": ["kind"]},
        "then": {"properties": {"x": true}},
        "else": {"properties": {"y": true}},
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"kind": "x", "x": 1})));
    assert!(!schema.is_valid(&json!({"kind": "x", "y": 1})));
    assert!(schema.is_valid(&json!({"y": 1})));
}

#[test]
fn test_reference_targets_claim() {
    let schema = schemawalk::build(&json!({
        "$defs": {"base": {"properties": {"a": true}}},
        "$ref": "#/$defs/base",
        "properties": {"b": true},
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
    assert!(!schema.is_valid(&json!({"a": 1, "z": 2})));
}

#[test]
fn test_pattern_and_additional_properties_claim() {
    let patterns = schemawalk::build(&json!({
        "patternProperties": {"^x-": true},
        "unevaluatedProperties": false
    }))
    .unwrap();
    assert!(patterns.is_valid(&json!({"x-a": 1})));
    assert!(!patterns.is_valid(&json!({"y": 1})));

    let additional = schemawalk::build(&json!({
        "allOf": [{"additionalProperties": true}],
        "unevaluatedProperties": false
    }))
    .unwrap();
    assert!(additional.is_valid(&json!({"anything": 1})));
}

#[test]
fn test_dependent_schemas_claim() {
    let schema = schemawalk::build(&json!({
        "dependentSchemas": {"card": {"properties": {"billing": true}}},
        "properties": {"card": true},
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"card": 1, "billing": 2})));
    assert!(!schema.is_valid(&json!({"billing": 2})));
}

#[test]
fn test_claims_do_not_cross_instance_boundaries() {
    let schema = schemawalk::build(&json!({
        "properties": {"inner": {"properties": {"a": true}}},
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"inner": {"b": 1}})));
    assert!(!schema.is_valid(&json!({"inner": {}, "outer": 1})));
}

#[test]
fn test_nested_unevaluated_claims_everything_it_sees() {
    let schema = schemawalk::build(&json!({
        "allOf": [{"unevaluatedProperties": true}],
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
}

#[test]
fn test_unevaluated_properties_schema_form() {
    let schema = schemawalk::build(&json!({
        "properties": {"id": {"type": "integer"}},
        "unevaluatedProperties": {"type": "string"}
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"id": 1, "note": "x"})));

    let report = schema.validate_report(&json!({"id": 1, "note": 2}), &JsonPointer::root());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].keyword, "type");
    assert_eq!(
        report.errors[0].evaluation_path.to_string(),
        "/unevaluatedProperties/type"
    );
}

#[test]
fn test_unevaluated_items_after_prefix() {
    let schema = schemawalk::build(&json!({
        "prefixItems": [{"type": "string"}],
        "unevaluatedItems": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!(["a"])));

    let report = schema.validate_report(&json!(["a", 2]), &JsonPointer::root());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].message, "unevaluated item at index 1 is not allowed");
    assert_eq!(report.errors[0].instance_location.to_string(), "/1");
}

#[test]
fn test_unevaluated_items_sees_nested_prefix_items() {
    let schema = schemawalk::build(&json!({
        "allOf": [{"prefixItems": [true, true]}],
        "unevaluatedItems": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!([1, 2])));
    assert!(!schema.is_valid(&json!([1, 2, 3])));
}

#[test]
fn test_contains_claims_matching_items() {
    let schema = schemawalk::build(&json!({
        "contains": {"type": "string"},
        "unevaluatedItems": {"type": "integer"}
    }))
    .unwrap();

    assert!(schema.is_valid(&json!(["a", 1, "b"])));
    assert!(!schema.is_valid(&json!(["a", 1.5])));
}

#[test]
fn test_contains_does_not_claim_in_2019_09() {
    let schema = SchemaBuilder::new()
        .options(Options::new().with_default_schema_version(Draft::Draft201909))
        .build(&json!({
            "contains": {"type": "string"},
            "unevaluatedItems": false
        }))
        .unwrap();

    let report = schema.validate_report(&json!(["a"]), &JsonPointer::root());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].keyword, "unevaluatedItems");
    assert_eq!(report.errors[0].instance_location.to_string(), "/0");
}

#[test]
fn test_items_array_claims_in_2019_09() {
    let schema = SchemaBuilder::new()
        .options(Options::new().with_default_schema_version(Draft::Draft201909))
        .build(&json!({
            "items": [true],
            "unevaluatedItems": false
        }))
        .unwrap();

    assert!(schema.is_valid(&json!([1])));
    assert!(!schema.is_valid(&json!([1, 2])));
}

#[test]
fn test_unevaluated_keywords_are_ignored_in_draft7() {
    let schema = SchemaBuilder::new()
        .options(Options::new().with_default_schema_version(Draft::Draft7))
        .build(&json!({
            "properties": {"a": true},
            "unevaluatedProperties": false
        }))
        .unwrap();

    assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
}
