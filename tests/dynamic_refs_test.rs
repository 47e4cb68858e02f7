//! Tests for late-bound references: `$dynamicRef` (2020-12) and
//! `$recursiveRef` (2019-09).

use schemawalk::{JsonPointer, MapResolver, SchemaBuilder};
use serde_json::{json, Value};

fn typical_dynamic_resolution(with_outer_anchor: bool) -> Value {
    let mut defs = json!({
        "list": {
            "$id": "list",
            "type": "array",
            "items": {"$dynamicRef": "#items"},
            "$defs": {
                "items": {"$dynamicAnchor": "items"}
            }
        }
    });
    if with_outer_anchor {
        defs["foo"] = json!({"$dynamicAnchor": "items", "type": "string"});
    }
    json!({
        "$id": "https://example.com/typical-dynamic-resolution/root",
        "$ref": "list",
        "$defs": defs
    })
}

#[test]
fn test_dynamic_ref_resolves_to_outermost_anchor() {
    let schema = schemawalk::build(&typical_dynamic_resolution(true)).unwrap();

    assert!(schema.is_valid(&json!(["foo", "bar"])));
    assert!(!schema.is_valid(&json!(["foo", 42])));

    let report = schema.validate_report(&json!(["foo", 42]), &JsonPointer::root());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].keyword, "type");
    assert_eq!(report.errors[0].instance_location.to_string(), "/1");
}

#[test]
fn test_dynamic_ref_without_outer_anchor_acts_like_ref() {
    let schema = schemawalk::build(&typical_dynamic_resolution(false)).unwrap();
    assert!(schema.is_valid(&json!(["foo", 42])));
}

#[test]
fn test_dynamic_ref_to_target_without_anchor_stays_static() {
    let schema = schemawalk::build(&json!({
        "$id": "https://example.com/static-target/root",
        "$dynamicAnchor": "value",
        "type": ["object", "integer"],
        "properties": {"inner": {"$dynamicRef": "#/$defs/value"}},
        "$defs": {"value": {"type": "integer"}}
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"inner": 1})));
    assert!(!schema.is_valid(&json!({"inner": {"inner": 1}})));
}

#[test]
fn test_extensible_tree_through_external_document() {
    let resolver = MapResolver::new().with_document(
        "https://example.com/tree",
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": "https://example.com/tree",
            "$dynamicAnchor": "node",
            "type": "object",
            "properties": {
                "data": true,
                "children": {"type": "array", "items": {"$dynamicRef": "#node"}}
            }
        }),
    );

    let strict = SchemaBuilder::new()
        .resolver(resolver)
        .build(&json!({
            "$id": "https://example.com/strict-tree",
            "$dynamicAnchor": "node",
            "$ref": "tree",
            "unevaluatedProperties": false
        }))
        .unwrap();

    assert!(strict.is_valid(&json!({"children": [{"data": 1}]})));

    let report = strict.validate_report(&json!({"children": [{"daat": 1}]}), &JsonPointer::root());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].keyword, "unevaluatedProperties");
    assert_eq!(
        report.errors[0].instance_location.to_string(),
        "/children/0/daat"
    );
}

fn recursive_object(root_anchor: bool) -> Value {
    let mut schema = json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "http://localhost:4242/recursive/schema.json",
        "$defs": {
            "myobject": {
                "$id": "myobject.json",
                "$recursiveAnchor": true,
                "anyOf": [
                    {"type": "string"},
                    {"type": "object", "additionalProperties": {"$recursiveRef": "#"}}
                ]
            }
        },
        "anyOf": [
            {"type": "integer"},
            {"$ref": "#/$defs/myobject"}
        ]
    });
    if root_anchor {
        schema["$recursiveAnchor"] = json!(true);
    }
    schema
}

#[test]
fn test_recursive_ref_without_root_anchor_stays_inside_resource() {
    let schema = schemawalk::build(&recursive_object(false)).unwrap();

    assert!(schema.is_valid(&json!(1)));
    assert!(schema.is_valid(&json!({"foo": "bar"})));
    assert!(schema.is_valid(&json!({"foo": {"bar": "baz"}})));
    assert!(!schema.is_valid(&json!({"foo": 1})));
}

#[test]
fn test_recursive_ref_moves_to_outermost_anchor() {
    let schema = schemawalk::build(&recursive_object(true)).unwrap();

    assert!(schema.is_valid(&json!({"foo": 1})));
    assert!(schema.is_valid(&json!({"foo": {"bar": 2}})));
    assert!(!schema.is_valid(&json!({"foo": 1.5})));
}

#[test]
fn test_recursive_ref_is_plain_ref_without_anchor() {
    let schema = schemawalk::build(&json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "properties": {
            "name": {"type": "string"},
            "child": {"$recursiveRef": "#"}
        }
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"child": {"child": {"name": "x"}}})));
    assert!(!schema.is_valid(&json!({"child": {"child": {"name": 1}}})));
}

#[test]
fn test_resources_entered_through_pointer_refs_join_the_scope() {
    let schema = schemawalk::build(&json!({
        "$id": "https://example.com/scopes/base",
        "$ref": "first#/$defs/stuff",
        "$defs": {
            "first": {
                "$id": "first",
                "$defs": {
                    "stuff": {"$ref": "second#/$defs/stuff"},
                    "length": {"maxLength": 1}
                }
            },
            "second": {
                "$id": "second",
                "$defs": {
                    "stuff": {"$ref": "third#/$defs/stuff"},
                    "length": {"$dynamicAnchor": "length", "maxLength": 2}
                }
            },
            "third": {
                "$id": "third",
                "$defs": {
                    "stuff": {"$dynamicRef": "#length"},
                    "length": {"$dynamicAnchor": "length", "maxLength": 3}
                }
            }
        }
    }))
    .unwrap();

    assert!(schema.is_valid(&json!("")));
    assert!(schema.is_valid(&json!("ab")));
    assert!(!schema.is_valid(&json!("abc")));

    let report = schema.validate_report(&json!("abc"), &JsonPointer::root());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].schema_location.to_string(),
        "https://example.com/scopes/second#/$defs/length/maxLength"
    );
}
