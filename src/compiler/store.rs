//! Compilation-session store of schema identities.
//!
//! The store maps every URI a compiled node is reachable under to its
//! [`NodeId`], remembers unrecognized keywords so references into arbitrary
//! substructure can be compiled on demand, and queues references until the
//! late-binding pass. It lives only as long as one build.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use crate::compiler::Draft;
use crate::error::SchemaError;
use crate::path::JsonPointer;
use crate::schema::{NodeId, RefId};
use crate::uri::SchemaUri;

/// An unrecognized keyword value kept for on-demand compilation.
#[derive(Debug, Clone)]
pub(crate) struct UnknownKeyword {
    pub(crate) uri: SchemaUri,
    pub(crate) value: Value,
    pub(crate) draft: Draft,
}

/// Everything known under one base URI.
#[derive(Debug, Default)]
struct StoreEntry {
    /// Compiled nodes keyed by decoded fragment (`""`, `/$defs/a`, `anchor`).
    schemas: HashMap<String, NodeId>,
    /// Unrecognized keywords keyed by decoded JSON-Pointer fragment.
    unknown_keywords: HashMap<String, UnknownKeyword>,
    /// `$dynamicAnchor` declarations of the resource.
    dynamic_anchors: HashMap<String, NodeId>,
}

#[derive(Debug, Default)]
pub(crate) struct SchemaStore {
    entries: HashMap<String, StoreEntry>,
    resources: Vec<(NodeId, String)>,
    pending: VecDeque<(RefId, Draft)>,
}

impl SchemaStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `node` under `uri`.
    ///
    /// Registering the same node twice is allowed; a different node at an
    /// already registered URI is a duplicate identity.
    pub(crate) fn register(&mut self, uri: &SchemaUri, node: NodeId) -> Result<(), SchemaError> {
        let entry = self.entries.entry(uri.base_key()).or_default();
        match entry.schemas.get(&uri.fragment()) {
            Some(existing) if *existing != node => Err(SchemaError::DuplicateIdentity(uri.clone())),
            Some(_) => Ok(()),
            None => {
                entry.schemas.insert(uri.fragment(), node);
                Ok(())
            }
        }
    }

    pub(crate) fn lookup(&self, uri: &SchemaUri) -> Option<NodeId> {
        self.entries
            .get(&uri.base_key())
            .and_then(|entry| entry.schemas.get(&uri.fragment()))
            .copied()
    }

    /// True if any node was registered under the base of `uri`.
    pub(crate) fn knows_document(&self, uri: &SchemaUri) -> bool {
        self.entries
            .get(&uri.base_key())
            .is_some_and(|entry| !entry.schemas.is_empty())
    }

    pub(crate) fn add_unknown_keyword(&mut self, uri: SchemaUri, value: Value, draft: Draft) {
        let entry = self.entries.entry(uri.base_key()).or_default();
        entry
            .unknown_keywords
            .insert(uri.fragment(), UnknownKeyword { uri, value, draft });
    }

    /// Removes and returns the stored keyword whose location is the longest
    /// JSON-Pointer prefix of `uri`.
    pub(crate) fn take_unknown_prefix(&mut self, uri: &SchemaUri) -> Option<UnknownKeyword> {
        let target = uri.pointer()?;
        let entry = self.entries.get_mut(&uri.base_key())?;
        let key = entry
            .unknown_keywords
            .keys()
            .filter_map(|key| JsonPointer::parse(key).map(|pointer| (key, pointer)))
            .filter(|(_, pointer)| pointer.is_prefix_of(&target))
            .max_by_key(|(_, pointer)| pointer.len())
            .map(|(key, _)| key.clone())?;
        entry.unknown_keywords.remove(&key)
    }

    pub(crate) fn add_dynamic_anchor(&mut self, base: &SchemaUri, name: &str, node: NodeId) {
        self.entries
            .entry(base.base_key())
            .or_default()
            .dynamic_anchors
            .insert(name.to_string(), node);
    }

    pub(crate) fn dynamic_anchors(&self, base_key: &str) -> HashMap<String, NodeId> {
        self.entries
            .get(base_key)
            .map(|entry| entry.dynamic_anchors.clone())
            .unwrap_or_default()
    }

    pub(crate) fn add_resource(&mut self, node: NodeId, id: &SchemaUri) {
        self.resources.push((node, id.base_key()));
    }

    pub(crate) fn resources(&self) -> &[(NodeId, String)] {
        &self.resources
    }

    pub(crate) fn queue_reference(&mut self, reference: RefId, draft: Draft) {
        self.pending.push_back((reference, draft));
    }

    pub(crate) fn next_reference(&mut self) -> Option<(RefId, Draft)> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BooleanNode, SchemaArena, SchemaNode};
    use serde_json::json;

    fn uri(s: &str) -> SchemaUri {
        SchemaUri::parse(s).unwrap()
    }

    fn nodes(count: usize) -> Vec<NodeId> {
        let mut arena = SchemaArena::new();
        (0..count)
            .map(|_| arena.push(SchemaNode::Boolean(BooleanNode::new(true, uri("urn:x")))))
            .collect()
    }

    #[test]
    fn test_register_and_lookup() {
        let ids = nodes(1);
        let mut store = SchemaStore::new();
        store
            .register(&uri("http://example.com/s.json#/$defs/a"), ids[0])
            .unwrap();
        assert_eq!(
            store.lookup(&uri("http://example.com/s.json#/$defs/a")),
            Some(ids[0])
        );
        assert_eq!(store.lookup(&uri("http://example.com/s.json#/$defs/b")), None);
        assert!(store.knows_document(&uri("http://example.com/s.json")));
        assert!(!store.knows_document(&uri("http://example.com/other.json")));
    }

    #[test]
    fn test_percent_encoded_fragment_matches_decoded_registration() {
        let ids = nodes(1);
        let mut store = SchemaStore::new();
        let registered = SchemaUri::default_base()
            .append_keyword("$defs")
            .append_keyword("percent%field");
        store.register(&registered, ids[0]).unwrap();

        let reference = SchemaUri::default_base()
            .resolve("#/$defs/percent%25field")
            .unwrap();
        assert_eq!(store.lookup(&reference), Some(ids[0]));
    }

    #[test]
    fn test_duplicate_identity() {
        let ids = nodes(2);
        let mut store = SchemaStore::new();
        let id = uri("http://example.com/item.json");
        store.register(&id, ids[0]).unwrap();
        store.register(&id, ids[0]).unwrap();
        let err = store.register(&id, ids[1]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateIdentity(_)));
    }

    #[test]
    fn test_take_unknown_prefix_picks_longest() {
        let mut store = SchemaStore::new();
        let base = uri("http://example.com/s.json");
        store.add_unknown_keyword(
            base.append_keyword("x-extra"),
            json!({"a": {"type": "string"}}),
            Draft::Draft202012,
        );
        store.add_unknown_keyword(
            base.append_keyword("x-extra").append_keyword("a"),
            json!({"type": "string"}),
            Draft::Draft202012,
        );

        let found = store
            .take_unknown_prefix(&uri("http://example.com/s.json#/x-extra/a/type"))
            .unwrap();
        assert_eq!(found.uri.fragment(), "/x-extra/a");
        assert!(store
            .take_unknown_prefix(&uri("http://example.com/s.json#/x-extra/a"))
            .is_some());
        assert!(store
            .take_unknown_prefix(&uri("http://example.com/s.json#/x-extra/a"))
            .is_none());
    }

    #[test]
    fn test_reference_queue_is_fifo() {
        let mut arena = SchemaArena::new();
        let a = arena.push_reference(uri("urn:a"));
        let b = arena.push_reference(uri("urn:b"));
        let mut store = SchemaStore::new();
        store.queue_reference(a, Draft::Draft7);
        store.queue_reference(b, Draft::Draft202012);
        assert_eq!(store.next_reference(), Some((a, Draft::Draft7)));
        assert_eq!(store.next_reference(), Some((b, Draft::Draft202012)));
        assert_eq!(store.next_reference(), None);
    }
}
