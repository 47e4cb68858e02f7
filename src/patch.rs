//! Default-value patches.
//!
//! Validation records an "add" operation for every property a schema gives a
//! `default` but the instance omits. The patch can be rendered as JSON or
//! applied to produce the defaulted view of the instance.

use serde_json::{json, Value};

use crate::path::{JsonPointer, PathSegment};

/// One "add" operation: insert `value` at `path` if nothing is there.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    /// Where the value is inserted.
    pub path: JsonPointer,
    /// The default value.
    pub value: Value,
}

/// An ordered list of default-value insertions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    operations: Vec<PatchOperation>,
}

impl Patch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an insertion.
    pub fn add(&mut self, path: JsonPointer, value: Value) {
        self.operations.push(PatchOperation { path, value });
    }

    /// Moves every operation of `other` onto the end of this patch.
    pub fn extend(&mut self, other: Patch) {
        self.operations.extend(other.operations);
    }

    /// Returns true if there is nothing to insert.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns an iterator over the operations.
    pub fn iter(&self) -> impl Iterator<Item = &PatchOperation> {
        self.operations.iter()
    }

    /// Renders the patch as `[{"op": "add", "path": ..., "value": ...}]`.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.operations
                .iter()
                .map(|op| json!({"op": "add", "path": op.path.to_string(), "value": op.value}))
                .collect(),
        )
    }

    /// Returns a copy of `instance` with every default inserted.
    ///
    /// Operations whose parent is missing or whose target already exists are
    /// skipped; defaults never overwrite instance data.
    pub fn apply(&self, instance: &Value) -> Value {
        let mut patched = instance.clone();
        for op in &self.operations {
            let Some(PathSegment::Field(name)) = op.path.last() else {
                continue;
            };
            let parent_path = op.path.parent().unwrap_or_default();
            if let Some(Value::Object(map)) = patched.pointer_mut(&parent_path.to_string()) {
                map.entry(name.clone()).or_insert_with(|| op.value.clone());
            }
        }
        patched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_json() {
        let mut patch = Patch::new();
        patch.add(JsonPointer::root().push_field("role"), json!("user"));
        assert_eq!(
            patch.to_json(),
            json!([{"op": "add", "path": "/role", "value": "user"}])
        );
    }

    #[test]
    fn test_apply_inserts_missing_only() {
        let mut patch = Patch::new();
        patch.add(JsonPointer::root().push_field("role"), json!("user"));
        patch.add(JsonPointer::root().push_field("name"), json!("default"));
        patch.add(
            JsonPointer::root().push_field("nested").push_field("flag"),
            json!(true),
        );

        let patched = patch.apply(&json!({"name": "Alice", "nested": {}}));
        assert_eq!(
            patched,
            json!({"name": "Alice", "nested": {"flag": true}, "role": "user"})
        );
    }

    #[test]
    fn test_apply_skips_missing_parent() {
        let mut patch = Patch::new();
        patch.add(
            JsonPointer::root().push_field("absent").push_field("x"),
            json!(1),
        );
        assert_eq!(patch.apply(&json!({})), json!({}));
    }

    #[test]
    fn test_extend() {
        let mut a = Patch::new();
        a.add(JsonPointer::root().push_field("a"), json!(1));
        let mut b = Patch::new();
        b.add(JsonPointer::root().push_field("b"), json!(2));
        a.extend(b);
        assert_eq!(a.len(), 2);
        assert!(!a.is_empty());
    }
}
