//! Tests that a compiled schema can be shared across threads.

use std::sync::Arc;
use std::thread;

use schemawalk::{CompiledSchema, JsonPointer};
use serde_json::json;

fn tree_schema() -> CompiledSchema {
    schemawalk::build(&json!({
        "$defs": {
            "node": {
                "type": "object",
                "properties": {
                    "value": {"type": "integer"},
                    "children": {"type": "array", "items": {"$ref": "#/$defs/node"}}
                },
                "required": ["value"],
                "unevaluatedProperties": false
            }
        },
        "$ref": "#/$defs/node"
    }))
    .unwrap()
}

#[test]
fn test_schema_is_shared_between_threads() {
    let schema = Arc::new(tree_schema());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let valid = json!({"value": i, "children": [{"value": i + 1}]});
                let invalid = json!({"value": i, "children": [{"value": "x", "extra": 1}]});
                let report = schema.validate_report(&invalid, &JsonPointer::root());
                (schema.is_valid(&valid), report.errors.len())
            })
        })
        .collect();

    for handle in handles {
        let (valid, error_count) = handle.join().unwrap();
        assert!(valid);
        assert_eq!(error_count, 2);
    }
}

#[test]
fn test_validate_many_matches_sequential_results() {
    let schema = tree_schema();
    let instances: Vec<_> = (0..64)
        .map(|i| {
            if i % 3 == 0 {
                json!({"value": "bad"})
            } else {
                json!({"value": i, "children": []})
            }
        })
        .collect();

    let parallel = schema.validate_many(&instances);
    assert_eq!(parallel.len(), instances.len());
    for (instance, result) in instances.iter().zip(&parallel) {
        assert_eq!(result.is_success(), schema.is_valid(instance));
    }
}
