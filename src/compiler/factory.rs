//! The schema validator factory.
//!
//! [`SchemaFactory`] compiles schema JSON into nodes of a [`SchemaArena`],
//! registers each node under every URI it is reachable by, and afterwards
//! binds every queued reference in a single late-binding pass.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::compiler::context::CompilationContext;
use crate::compiler::dialect::{Draft, KeywordCtor, KeywordTable};
use crate::compiler::resolver::SchemaResolver;
use crate::compiler::store::{SchemaStore, UnknownKeyword};
use crate::error::SchemaError;
use crate::format::{FormatChecker, FormatRegistry};
use crate::options::Options;
use crate::schema::{
    array, object, BooleanNode, KeywordValidator, NodeId, ObjectNode, RefId, SchemaArena,
    SchemaNode,
};
use crate::uri::SchemaUri;

/// Keywords the factory handles itself rather than through a keyword table.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$anchor",
    "$dynamicAnchor",
    "$recursiveAnchor",
    "$defs",
    "definitions",
    "$comment",
    "$vocabulary",
    "default",
    "errorMessage",
];

/// Compiles schema documents for one build.
pub(crate) struct SchemaFactory {
    arena: SchemaArena,
    store: SchemaStore,
    tables: HashMap<Draft, KeywordTable>,
    formats: FormatRegistry,
    options: Options,
}

impl SchemaFactory {
    pub(crate) fn new(options: &Options) -> Self {
        let tables = [
            Draft::Draft4,
            Draft::Draft7,
            Draft::Draft201909,
            Draft::Draft202012,
        ]
        .into_iter()
        .map(|draft| (draft, draft.keyword_table()))
        .collect();
        Self {
            arena: SchemaArena::new(),
            store: SchemaStore::new(),
            tables,
            formats: FormatRegistry::new(options.format_checkers()),
            options: options.clone(),
        }
    }

    /// Returns a compiled node, for constructors that inspect their children.
    pub(crate) fn node(&self, id: NodeId) -> &SchemaNode {
        self.arena.node(id)
    }

    /// Returns the checker for `format` if format assertion is enabled.
    pub(crate) fn format_checker(&self, format: &str) -> Option<FormatChecker> {
        if !self.options.require_format_validation {
            return None;
        }
        self.formats.get(format)
    }

    /// Allocates an unbound reference to `uri` and queues it for resolution.
    pub(crate) fn reference(&mut self, uri: SchemaUri, draft: Draft) -> RefId {
        let id = self.arena.push_reference(uri);
        self.store.queue_reference(id, draft);
        id
    }

    /// Keeps a keyword value that compiled to no validator, so references
    /// into it can still be compiled on demand.
    pub(crate) fn keep_unused(&mut self, ctx: &CompilationContext, keyword: &str, value: &Value) {
        self.store
            .add_unknown_keyword(ctx.keyword_location(keyword), value.clone(), ctx.draft());
    }

    /// Compiles a whole document rooted at `base`.
    pub(crate) fn compile_document(
        &mut self,
        base: SchemaUri,
        document: &Value,
        draft: Draft,
    ) -> Result<NodeId, SchemaError> {
        debug!(base = %base, dialect = ?draft, "compiling schema document");
        let seed =
            CompilationContext::document(base, draft, self.options.enable_custom_error_message);
        self.make_schema_validator(&seed, document, &[])
    }

    /// Compiles `schema`, found under `keys` relative to `parent`.
    pub(crate) fn make_schema_validator(
        &mut self,
        parent: &CompilationContext,
        schema: &Value,
        keys: &[&str],
    ) -> Result<NodeId, SchemaError> {
        let ctx = parent.derive(schema, keys)?;
        let node = match schema {
            Value::Bool(value) => {
                SchemaNode::Boolean(BooleanNode::new(*value, ctx.location().clone()))
            }
            Value::Object(map) => SchemaNode::Object(self.make_object_node(&ctx, map)?),
            _ => {
                return Err(SchemaError::InvalidSchema {
                    location: ctx.location().clone(),
                })
            }
        };
        let id = self.arena.push(node);
        for uri in ctx.uris() {
            self.store.register(uri, id)?;
        }
        if let Some(resource) = ctx.id() {
            self.store.add_resource(id, resource);
        }
        if let Some(anchor) = self.arena.node(id).dynamic_anchor() {
            let anchor = anchor.to_string();
            self.store.add_dynamic_anchor(ctx.base(), &anchor, id);
        }
        Ok(id)
    }

    fn make_object_node(
        &mut self,
        ctx: &CompilationContext,
        map: &Map<String, Value>,
    ) -> Result<ObjectNode, SchemaError> {
        let draft = ctx.draft();
        let defs = self.make_definitions(ctx, map)?;

        let mut keywords: Vec<Box<dyn KeywordValidator>> = Vec::new();
        let mut unevaluated_properties = None;
        let mut unevaluated_items = None;

        let override_ref = if draft.ref_overrides_siblings() {
            map.get("$ref")
        } else {
            None
        };

        if let Some(reference) = override_ref {
            if let Some(ctor) = self.constructor(draft, "$ref") {
                if let Some(validator) = ctor(self, ctx, map, reference)? {
                    keywords.push(validator);
                }
            }
            for (key, value) in map {
                if key != "$ref" && !self.is_structural(draft, key) {
                    self.store
                        .add_unknown_keyword(ctx.keyword_location(key), value.clone(), draft);
                }
            }
        } else {
            for (key, value) in map {
                if self.is_structural(draft, key) {
                    continue;
                }
                match key.as_str() {
                    "unevaluatedProperties" if draft.supports_unevaluated() => {
                        unevaluated_properties =
                            Some(object::compile_unevaluated_properties(self, ctx, value)?);
                        continue;
                    }
                    "unevaluatedItems" if draft.supports_unevaluated() => {
                        unevaluated_items =
                            Some(array::compile_unevaluated_items(self, ctx, value)?);
                        continue;
                    }
                    _ => {}
                }
                match self.constructor(draft, key) {
                    Some(ctor) => {
                        if let Some(validator) = ctor(self, ctx, map, value)? {
                            keywords.push(validator);
                        }
                    }
                    None => {
                        self.store
                            .add_unknown_keyword(ctx.keyword_location(key), value.clone(), draft);
                    }
                }
            }
        }

        let recursive_anchor = draft == Draft::Draft201909
            && map.get("$recursiveAnchor").and_then(Value::as_bool) == Some(true);
        let dynamic_anchor = if draft == Draft::Draft202012 {
            map.get("$dynamicAnchor")
                .and_then(Value::as_str)
                .map(str::to_string)
        } else {
            None
        };

        Ok(ObjectNode::new(
            ctx.location().clone(),
            keywords,
            unevaluated_properties,
            unevaluated_items,
        )
        .with_definitions(defs)
        .with_default(map.get("default").cloned())
        .with_identity(ctx.id().cloned(), recursive_anchor, dynamic_anchor))
    }

    /// Compiles `$defs` and `definitions` ahead of every other keyword.
    fn make_definitions(
        &mut self,
        ctx: &CompilationContext,
        map: &Map<String, Value>,
    ) -> Result<IndexMap<String, NodeId>, SchemaError> {
        let mut defs = IndexMap::new();
        for keyword in ["$defs", "definitions"] {
            match map.get(keyword) {
                None => {}
                Some(Value::Object(entries)) => {
                    for (name, schema) in entries {
                        let id = self.make_schema_validator(ctx, schema, &[keyword, name])?;
                        defs.insert(name.clone(), id);
                    }
                }
                Some(_) => {
                    return Err(SchemaError::invalid_keyword(
                        ctx.location(),
                        keyword,
                        "an object of schemas",
                    ))
                }
            }
        }
        Ok(defs)
    }

    fn constructor(&self, draft: Draft, keyword: &str) -> Option<KeywordCtor> {
        self.tables
            .get(&draft)
            .and_then(|table| table.get(keyword))
            .copied()
    }

    fn is_structural(&self, draft: Draft, keyword: &str) -> bool {
        STRUCTURAL_KEYWORDS.contains(&keyword) || keyword == draft.id_keyword()
    }

    /// Binds every queued reference.
    ///
    /// Targets are looked up in the store first, then compiled on demand from
    /// stored unknown keywords, and finally fetched through `resolver`, at
    /// most once per document.
    pub(crate) fn resolve_references(
        &mut self,
        resolver: Option<&dyn SchemaResolver>,
    ) -> Result<(), SchemaError> {
        let mut fetched = HashSet::new();
        while let Some((reference, draft)) = self.store.next_reference() {
            let uri = self.arena.reference(reference).uri().clone();
            match self.locate(&uri, draft, resolver, &mut fetched)? {
                Some(target) => {
                    trace!(reference = %uri, "bound reference");
                    let resource = self
                        .store
                        .lookup(&uri.base())
                        .filter(|&node| self.arena.node(node).is_resource());
                    self.arena.bind(reference, target, resource);
                }
                None if self.options.lazy_references => {
                    warn!(reference = %uri, "leaving reference unresolved");
                }
                None => return Err(SchemaError::UnresolvedReference(uri)),
            }
        }
        self.link_dynamic_anchors();
        Ok(())
    }

    fn locate(
        &mut self,
        uri: &SchemaUri,
        draft: Draft,
        resolver: Option<&dyn SchemaResolver>,
        fetched: &mut HashSet<String>,
    ) -> Result<Option<NodeId>, SchemaError> {
        loop {
            if let Some(node) = self.store.lookup(uri) {
                return Ok(Some(node));
            }
            if let Some(unknown) = self.store.take_unknown_prefix(uri) {
                self.compile_unknown_keyword(unknown)?;
                continue;
            }
            let Some(resolver) = resolver else {
                return Ok(None);
            };
            if self.store.knows_document(uri) || !fetched.insert(uri.base_key()) {
                return Ok(None);
            }

            let base = uri.base();
            debug!(document = %base, "fetching external schema");
            match resolver.resolve(base.as_url()) {
                Ok(document) => {
                    self.compile_document(base, &document, draft)?;
                }
                Err(source) if self.options.lazy_references => {
                    warn!(document = %base, error = %source, "external schema unavailable");
                    return Ok(None);
                }
                Err(source) => return Err(SchemaError::Resolve { uri: base, source }),
            }
        }
    }

    /// Compiles a stored unknown keyword so references into it can bind.
    fn compile_unknown_keyword(&mut self, unknown: UnknownKeyword) -> Result<(), SchemaError> {
        debug!(location = %unknown.uri, "compiling unknown keyword on demand");
        let seed = CompilationContext::fragment(unknown.uri, unknown.draft);
        match &unknown.value {
            Value::Object(_) | Value::Bool(_) => {
                self.make_schema_validator(&seed, &unknown.value, &[])?;
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if item.is_object() || item.is_boolean() {
                        let key = index.to_string();
                        self.make_schema_validator(&seed, item, &[key.as_str()])?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Gives every resource node the dynamic anchors declared inside it.
    fn link_dynamic_anchors(&mut self) {
        let links: Vec<_> = self
            .store
            .resources()
            .iter()
            .map(|(node, base)| (*node, self.store.dynamic_anchors(base)))
            .filter(|(_, anchors)| !anchors.is_empty())
            .collect();
        for (node, anchors) in links {
            self.arena.node_mut(node).set_anchor_dict(anchors);
        }
    }

    /// Releases the compiled arena; the store is dropped with the factory.
    pub(crate) fn finish(self) -> SchemaArena {
        self.arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(schema: Value) -> Result<(SchemaFactory, NodeId), SchemaError> {
        let mut factory = SchemaFactory::new(&Options::default());
        let root =
            factory.compile_document(SchemaUri::default_base(), &schema, Draft::Draft202012)?;
        factory.resolve_references(None)?;
        Ok((factory, root))
    }

    #[test]
    fn test_every_uri_is_registered() {
        let (factory, _) = compile(json!({
            "$defs": {"a": {"$id": "http://example.com/a.json", "$anchor": "here"}}
        }))
        .unwrap();
        let by_pointer = factory
            .store
            .lookup(&SchemaUri::default_base().resolve("#/$defs/a").unwrap());
        let by_id = factory
            .store
            .lookup(&SchemaUri::parse("http://example.com/a.json").unwrap());
        let by_anchor = factory
            .store
            .lookup(&SchemaUri::parse("http://example.com/a.json#here").unwrap());
        assert!(by_pointer.is_some());
        assert_eq!(by_pointer, by_id);
        assert_eq!(by_pointer, by_anchor);
    }

    #[test]
    fn test_invalid_schema_shape() {
        let err = compile(json!({"properties": {"a": 5}})).err().unwrap();
        match err {
            SchemaError::InvalidSchema { location } => {
                assert_eq!(location.fragment(), "/properties/a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_identity_is_fatal() {
        let err = compile(json!({
            "$defs": {
                "a": {"$id": "http://example.com/same.json"},
                "b": {"$id": "http://example.com/same.json"}
            }
        }))
        .err()
        .unwrap();
        assert!(matches!(err, SchemaError::DuplicateIdentity(_)));
    }

    #[test]
    fn test_unresolved_reference_is_fatal() {
        let err = compile(json!({"$ref": "#/$defs/missing"})).err().unwrap();
        assert!(matches!(err, SchemaError::UnresolvedReference(_)));
    }

    #[test]
    fn test_lazy_references_leave_slot_empty() {
        let options = Options::new().with_lazy_references(true);
        let mut factory = SchemaFactory::new(&options);
        factory
            .compile_document(
                SchemaUri::default_base(),
                &json!({"$ref": "#/$defs/missing"}),
                Draft::Draft202012,
            )
            .unwrap();
        factory.resolve_references(None).unwrap();
        assert_eq!(factory.finish().unresolved_references().count(), 1);
    }

    #[test]
    fn test_unknown_keyword_compiled_on_demand() {
        let (factory, _) = compile(json!({
            "x-library": {"positive": {"minimum": 0}},
            "$ref": "#/x-library/positive"
        }))
        .unwrap();
        let target = factory
            .store
            .lookup(&SchemaUri::default_base().resolve("#/x-library/positive").unwrap());
        assert!(target.is_some());
    }

    #[test]
    fn test_unevaluated_keywords_never_always_succeed() {
        let (factory, root) = compile(json!({"unevaluatedProperties": true})).unwrap();
        assert!(!factory.node(root).always_succeeds());
    }

    #[test]
    fn test_dynamic_anchors_linked_to_resource() {
        let (factory, root) = compile(json!({
            "$defs": {"node": {"$dynamicAnchor": "node"}}
        }))
        .unwrap();
        assert!(factory.node(root).dynamic_anchor_in_resource("node").is_some());
    }
}
