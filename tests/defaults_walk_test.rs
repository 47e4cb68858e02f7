//! Tests for default-value patches and the walk protocol.

use pretty_assertions::assert_eq;
use schemawalk::{DefaultsCollector, JsonPointer, WalkEvent, WalkResult};
use serde_json::json;

#[test]
fn test_validation_collects_defaults_for_absent_properties() {
    let schema = schemawalk::build(&json!({
        "properties": {
            "name": {"type": "string"},
            "role": {"default": "user"},
            "active": {"default": true}
        }
    }))
    .unwrap();

    let report = schema.validate_report(&json!({"name": "a", "active": false}), &JsonPointer::root());
    assert!(report.is_valid());
    assert_eq!(
        report.patch.to_json(),
        json!([{"op": "add", "path": "/role", "value": "user"}])
    );
}

#[test]
fn test_validate_returns_patched_instance() {
    let schema = schemawalk::build(&json!({
        "properties": {
            "settings": {
                "type": "object",
                "properties": {"theme": {"default": "dark"}}
            }
        }
    }))
    .unwrap();

    let result = schema.validate(&json!({"settings": {}}));
    assert!(result.is_success());
    match result {
        stillwater::Validation::Success(patched) => {
            assert_eq!(patched, json!({"settings": {"theme": "dark"}}));
        }
        stillwater::Validation::Failure(_) => panic!("expected success"),
    }
}

#[test]
fn test_defaults_inside_array_items() {
    let schema = schemawalk::build(&json!({
        "items": {"properties": {"count": {"default": 0}}}
    }))
    .unwrap();

    let report = schema.validate_report(&json!([{}, {"count": 5}]), &JsonPointer::root());
    assert_eq!(
        report.patch.apply(&json!([{}, {"count": 5}])),
        json!([{"count": 0}, {"count": 5}])
    );
}

#[test]
fn test_default_patch_is_kept_for_invalid_instances() {
    let schema = schemawalk::build(&json!({
        "properties": {"a": {"type": "integer"}, "b": {"default": "x"}}
    }))
    .unwrap();

    let report = schema.validate_report(&json!({"a": "no"}), &JsonPointer::root());
    assert!(!report.is_valid());
    assert_eq!(report.patch.len(), 1);
    assert!(schema.validate(&json!({"a": "no"})).is_failure());
}

#[test]
fn test_walk_visits_keywords_in_order() {
    let schema = schemawalk::build(&json!({
        "type": "object",
        "properties": {
            "a": {"type": "string"},
            "b": {"default": 1}
        }
    }))
    .unwrap();

    let mut seen = Vec::new();
    let mut visitor = |event: &WalkEvent<'_>| {
        seen.push((
            event.keyword,
            event.evaluation_path.to_string(),
            event.instance_location.to_string(),
            event.default_value.cloned(),
        ));
        WalkResult::Advance
    };
    let result = schema.walk(&json!({"a": "x"}), &JsonPointer::root(), &mut visitor);

    assert_eq!(result, WalkResult::Advance);
    assert_eq!(
        seen,
        vec![
            ("type", "/type".to_string(), "".to_string(), None),
            ("properties", "/properties".to_string(), "".to_string(), None),
            ("type", "/properties/a/type".to_string(), "/a".to_string(), None),
            (
                "default",
                "/properties/b/default".to_string(),
                "/b".to_string(),
                Some(json!(1))
            ),
        ]
    );
}

#[test]
fn test_walk_stops_when_visitor_aborts() {
    let schema = schemawalk::build(&json!({
        "type": "object",
        "required": ["a"],
        "properties": {"a": {"type": "string"}}
    }))
    .unwrap();

    let mut count = 0;
    let mut visitor = |_: &WalkEvent<'_>| {
        count += 1;
        WalkResult::Abort
    };
    let result = schema.walk(&json!({}), &JsonPointer::root(), &mut visitor);

    assert_eq!(result, WalkResult::Abort);
    assert_eq!(count, 1);
}

#[test]
fn test_walk_follows_references_and_matching_branches() {
    let schema = schemawalk::build(&json!({
        "$defs": {"positive": {"minimum": 1}},
        "anyOf": [{"type": "string"}, {"$ref": "#/$defs/positive"}]
    }))
    .unwrap();

    let mut paths = Vec::new();
    let mut visitor = |event: &WalkEvent<'_>| {
        paths.push(event.evaluation_path.to_string());
        WalkResult::Advance
    };
    schema.walk(&json!(5), &JsonPointer::root(), &mut visitor);

    assert_eq!(
        paths,
        vec!["/anyOf", "/anyOf/1/$ref", "/anyOf/1/$ref/minimum"]
    );
}

#[test]
fn test_defaults_collector_and_apply_defaults_agree() {
    let schema = schemawalk::build(&json!({
        "allOf": [
            {"properties": {"a": {"default": 1}}},
            {"properties": {"b": {"default": 2}}}
        ]
    }))
    .unwrap();
    let instance = json!({"b": 5});

    let mut collector = DefaultsCollector::new();
    schema.walk(&instance, &JsonPointer::root(), &mut collector);
    let patch = collector.into_patch();

    assert_eq!(patch.apply(&instance), json!({"a": 1, "b": 5}));
    assert_eq!(schema.apply_defaults(&instance), json!({"a": 1, "b": 5}));
}
