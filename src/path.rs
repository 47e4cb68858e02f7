//! JSON Pointer representation for locating values in instances and schemas.
//!
//! This module provides [`JsonPointer`] and [`PathSegment`] for building
//! RFC 6901 pointers incrementally. Pointers are used for instance locations
//! in validation messages, for evaluation paths, and for navigating into
//! schema documents when a `$ref` targets a JSON-Pointer fragment.

use std::fmt::{self, Display};

use serde::{Serialize, Serializer};
use serde_json::Value;

/// A segment of a JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object member name (e.g., `user`, `$defs`)
    Field(String),
    /// An array index (e.g., `0`, `42`)
    Index(usize),
}

impl PathSegment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(&escape_token(name)),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// A JSON pointer (RFC 6901) to a value in a nested JSON structure.
///
/// Pointers are immutable: `push_field` and `push_index` return new pointers
/// so a parent location can be shared by every child it spawns.
///
/// # Example
///
/// ```rust
/// use schemawalk::JsonPointer;
///
/// let pointer = JsonPointer::root()
///     .push_field("users")
///     .push_index(0)
///     .push_field("a/b");
///
/// assert_eq!(pointer.to_string(), "/users/0/a~1b");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPointer {
    segments: Vec<PathSegment>,
}

impl JsonPointer {
    /// Creates an empty pointer referring to the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a pointer string such as `/$defs/item/0`.
    ///
    /// Every token is kept as a [`PathSegment::Field`]; whether a token is an
    /// array index depends on the document it is applied to. Returns `None`
    /// when the string is non-empty and does not start with `/`.
    pub fn parse(pointer: &str) -> Option<Self> {
        if pointer.is_empty() {
            return Some(Self::root());
        }
        let rest = pointer.strip_prefix('/')?;
        let segments = rest
            .split('/')
            .map(|token| PathSegment::Field(unescape_token(token)))
            .collect();
        Some(Self { segments })
    }

    /// Returns a new pointer with a field segment appended.
    pub fn push_field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Field(name.into()));
        Self { segments }
    }

    /// Returns a new pointer with an index segment appended.
    pub fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Returns a new pointer with every segment of `other` appended.
    pub fn join(&self, other: &JsonPointer) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Returns true if this pointer refers to the whole document.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in this pointer.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this pointer has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the pointer segments.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Returns the parent pointer, or None if this is the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the last segment, or None if this is the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Returns true if `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &JsonPointer) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| segment_eq(a, b))
    }

    /// Returns the segments of `self` that follow `prefix`, if `prefix` is a prefix.
    pub fn strip_prefix(&self, prefix: &JsonPointer) -> Option<JsonPointer> {
        if !prefix.is_prefix_of(self) {
            return None;
        }
        Some(Self {
            segments: self.segments[prefix.len()..].to_vec(),
        })
    }

    /// Looks up the value this pointer refers to inside `document`.
    pub fn resolve<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| match (current, segment) {
                (Value::Object(map), PathSegment::Field(name)) => map.get(name),
                (Value::Object(map), PathSegment::Index(idx)) => map.get(&idx.to_string()),
                (Value::Array(items), PathSegment::Index(idx)) => items.get(*idx),
                (Value::Array(items), PathSegment::Field(token)) => {
                    parse_array_index(token).and_then(|idx| items.get(idx))
                }
                _ => None,
            })
    }
}

impl Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn segment_eq(a: &PathSegment, b: &PathSegment) -> bool {
    match (a, b) {
        (PathSegment::Field(x), PathSegment::Field(y)) => x == y,
        (PathSegment::Index(x), PathSegment::Index(y)) => x == y,
        (PathSegment::Field(s), PathSegment::Index(i))
        | (PathSegment::Index(i), PathSegment::Field(s)) => *s == i.to_string(),
    }
}

fn parse_array_index(token: &str) -> Option<usize> {
    // "01" is not a valid array index
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_pointer_is_empty() {
        let pointer = JsonPointer::root();
        assert!(pointer.is_root());
        assert!(pointer.is_empty());
        assert_eq!(pointer.len(), 0);
        assert_eq!(pointer.to_string(), "");
    }

    #[test]
    fn test_nested_fields_and_indexes() {
        let pointer = JsonPointer::root()
            .push_field("users")
            .push_index(0)
            .push_field("email");
        assert_eq!(pointer.to_string(), "/users/0/email");
    }

    #[test]
    fn test_escaping() {
        let pointer = JsonPointer::root().push_field("a/b").push_field("m~n");
        assert_eq!(pointer.to_string(), "/a~1b/m~0n");
    }

    #[test]
    fn test_parse_round_trip() {
        let pointer = JsonPointer::parse("/$defs/a~1b/m~0n").unwrap();
        assert_eq!(pointer.to_string(), "/$defs/a~1b/m~0n");
        assert_eq!(
            pointer.last(),
            Some(&PathSegment::Field("m~n".to_string()))
        );
        assert!(JsonPointer::parse("no-slash").is_none());
        assert!(JsonPointer::parse("").unwrap().is_root());
    }

    #[test]
    fn test_pointer_immutability() {
        let base = JsonPointer::root().push_field("users");
        let a = base.push_index(0);
        let b = base.push_index(1);

        assert_eq!(base.to_string(), "/users");
        assert_eq!(a.to_string(), "/users/0");
        assert_eq!(b.to_string(), "/users/1");
    }

    #[test]
    fn test_parent_pointer() {
        let pointer = JsonPointer::root().push_field("a").push_index(3);
        let parent = pointer.parent().unwrap();
        assert_eq!(parent.to_string(), "/a");
        assert!(parent.parent().unwrap().is_root());
        assert!(JsonPointer::root().parent().is_none());
    }

    #[test]
    fn test_prefix_matching_across_segment_kinds() {
        let items = JsonPointer::parse("/items/0").unwrap();
        let deeper = JsonPointer::root()
            .push_field("items")
            .push_index(0)
            .push_field("type");
        assert!(items.is_prefix_of(&deeper));
        assert_eq!(
            deeper.strip_prefix(&items).unwrap().to_string(),
            "/type"
        );
        assert!(deeper.strip_prefix(&JsonPointer::parse("/other").unwrap()).is_none());
    }

    #[test]
    fn test_resolve() {
        let doc = json!({"a": [{"b": 1}, {"c": 2}], "": 3});
        assert_eq!(
            JsonPointer::parse("/a/1/c").unwrap().resolve(&doc),
            Some(&json!(2))
        );
        assert_eq!(JsonPointer::parse("/").unwrap().resolve(&doc), Some(&json!(3)));
        assert_eq!(JsonPointer::parse("/a/01").unwrap().resolve(&doc), None);
        assert_eq!(JsonPointer::parse("/missing").unwrap().resolve(&doc), None);
    }
}
