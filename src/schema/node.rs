//! The compiled schema arena and its nodes.
//!
//! Every compiled (sub)schema lives in a flat [`SchemaArena`] and is addressed
//! by a [`NodeId`]. References are slots in the same arena that start empty
//! and are bound once the whole document set has been compiled, so the
//! reference graph may be cyclic while ownership stays a simple tree.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ErrorReporter, ValidationMessage};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::traits::KeywordValidator;
use crate::uri::SchemaUri;
use crate::validation::{EvalContext, EvalFlags, EvaluationResults, Outcome, WalkResult};
use crate::walk::SchemaVisitor;

/// Index of a compiled node within a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Index of a reference slot within a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId(usize);

/// A reference target, bound at most once after compilation.
#[derive(Debug, Clone)]
pub struct ReferenceSlot {
    uri: SchemaUri,
    target: Option<NodeId>,
    resource: Option<NodeId>,
}

impl ReferenceSlot {
    /// The absolute URI the reference points at.
    pub fn uri(&self) -> &SchemaUri {
        &self.uri
    }

    /// The bound node, or `None` if the reference never resolved.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// The resource entered on the way to a target that is not itself a
    /// resource, such as the document behind `other.json#/$defs/x`.
    pub fn resource(&self) -> Option<NodeId> {
        self.resource
    }
}

/// Flat owner of every compiled node and reference slot.
#[derive(Default)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
    references: Vec<ReferenceSlot>,
}

impl SchemaArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, node: SchemaNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    /// Returns the number of compiled nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing was compiled.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push_reference(&mut self, uri: SchemaUri) -> RefId {
        self.references.push(ReferenceSlot {
            uri,
            target: None,
            resource: None,
        });
        RefId(self.references.len() - 1)
    }

    /// Returns the reference slot with the given id.
    pub fn reference(&self, id: RefId) -> &ReferenceSlot {
        &self.references[id.0]
    }

    pub(crate) fn bind(&mut self, id: RefId, target: NodeId, resource: Option<NodeId>) {
        let slot = &mut self.references[id.0];
        slot.target = Some(target);
        slot.resource = resource.filter(|&resource| resource != target);
    }

    /// Returns the slots that were left unbound.
    pub fn unresolved_references(&self) -> impl Iterator<Item = &ReferenceSlot> {
        self.references.iter().filter(|slot| slot.target.is_none())
    }
}

/// A compiled (sub)schema.
pub enum SchemaNode {
    /// `true` or `false`.
    Boolean(BooleanNode),
    /// A schema object.
    Object(ObjectNode),
}

impl SchemaNode {
    /// Canonical location of this node.
    pub fn location(&self) -> &SchemaUri {
        match self {
            SchemaNode::Boolean(node) => &node.location,
            SchemaNode::Object(node) => &node.location,
        }
    }

    /// True if every instance is valid against this node.
    pub fn always_succeeds(&self) -> bool {
        match self {
            SchemaNode::Boolean(node) => node.value,
            SchemaNode::Object(node) => node.always_succeeds,
        }
    }

    /// True if no instance is valid against this node.
    pub fn always_fails(&self) -> bool {
        match self {
            SchemaNode::Boolean(node) => !node.value,
            SchemaNode::Object(node) => node.always_fails,
        }
    }

    /// The `default` annotation, if any.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            SchemaNode::Boolean(_) => None,
            SchemaNode::Object(node) => node.default_value.as_ref(),
        }
    }

    /// True if this node starts a schema resource (document root or `$id`).
    pub fn is_resource(&self) -> bool {
        matches!(self, SchemaNode::Object(node) if node.id.is_some())
    }

    /// The resource identity, for resource nodes.
    pub fn id(&self) -> Option<&SchemaUri> {
        match self {
            SchemaNode::Boolean(_) => None,
            SchemaNode::Object(node) => node.id.as_ref(),
        }
    }

    /// True for a 2019-09 resource declaring `$recursiveAnchor: true`.
    pub fn recursive_anchor(&self) -> bool {
        matches!(self, SchemaNode::Object(node) if node.recursive_anchor)
    }

    /// The `$dynamicAnchor` declared directly on this node.
    pub fn dynamic_anchor(&self) -> Option<&str> {
        match self {
            SchemaNode::Boolean(_) => None,
            SchemaNode::Object(node) => node.dynamic_anchor.as_deref(),
        }
    }

    /// For a resource node, the node declaring `$dynamicAnchor: name` anywhere in the resource.
    pub fn dynamic_anchor_in_resource(&self, name: &str) -> Option<NodeId> {
        match self {
            SchemaNode::Boolean(_) => None,
            SchemaNode::Object(node) => node.anchor_dict.get(name).copied(),
        }
    }

    /// Named `$defs`/`definitions` children.
    pub fn definitions(&self) -> Option<&IndexMap<String, NodeId>> {
        match self {
            SchemaNode::Boolean(_) => None,
            SchemaNode::Object(node) => Some(&node.defs),
        }
    }

    pub(crate) fn set_anchor_dict(&mut self, anchors: HashMap<String, NodeId>) {
        if let SchemaNode::Object(node) = self {
            node.anchor_dict = anchors;
        }
    }

    pub(crate) fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        match self {
            SchemaNode::Boolean(node) => node.validate(ctx, location, reporter),
            SchemaNode::Object(node) => {
                node.validate(ctx, instance, location, results, reporter, patch)
            }
        }
    }

    pub(crate) fn walk(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        match self {
            SchemaNode::Boolean(_) => WalkResult::Advance,
            SchemaNode::Object(node) => node.walk(ctx, instance, location, visitor),
        }
    }
}

/// A boolean schema.
pub struct BooleanNode {
    value: bool,
    location: SchemaUri,
}

impl BooleanNode {
    pub(crate) fn new(value: bool, location: SchemaUri) -> Self {
        Self { value, location }
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        location: &JsonPointer,
        reporter: &mut dyn ErrorReporter,
    ) -> Outcome {
        if self.value {
            return Outcome::Valid;
        }
        let message = ValidationMessage::new(
            "false",
            self.location.clone(),
            location.clone(),
            "False schema always fails",
        )
        .with_evaluation_path(ctx.eval_path().clone());
        Outcome::reported(reporter.error(message))
    }
}

/// A schema object: keyword validators plus identity and annotations.
pub struct ObjectNode {
    location: SchemaUri,
    keywords: Vec<Box<dyn KeywordValidator>>,
    unevaluated_properties: Option<Box<dyn KeywordValidator>>,
    unevaluated_items: Option<Box<dyn KeywordValidator>>,
    defs: IndexMap<String, NodeId>,
    default_value: Option<Value>,
    id: Option<SchemaUri>,
    recursive_anchor: bool,
    dynamic_anchor: Option<String>,
    anchor_dict: HashMap<String, NodeId>,
    always_succeeds: bool,
    always_fails: bool,
}

impl ObjectNode {
    pub(crate) fn new(
        location: SchemaUri,
        keywords: Vec<Box<dyn KeywordValidator>>,
        unevaluated_properties: Option<Box<dyn KeywordValidator>>,
        unevaluated_items: Option<Box<dyn KeywordValidator>>,
    ) -> Self {
        let has_unevaluated = unevaluated_properties.is_some() || unevaluated_items.is_some();
        let always_succeeds = !has_unevaluated && keywords.iter().all(|k| k.always_succeeds());
        let always_fails = keywords.iter().any(|k| k.always_fails());
        Self {
            location,
            keywords,
            unevaluated_properties,
            unevaluated_items,
            defs: IndexMap::new(),
            default_value: None,
            id: None,
            recursive_anchor: false,
            dynamic_anchor: None,
            anchor_dict: HashMap::new(),
            always_succeeds,
            always_fails,
        }
    }

    pub(crate) fn with_definitions(mut self, defs: IndexMap<String, NodeId>) -> Self {
        self.defs = defs;
        self
    }

    pub(crate) fn with_default(mut self, default_value: Option<Value>) -> Self {
        self.default_value = default_value;
        self
    }

    pub(crate) fn with_identity(
        mut self,
        id: Option<SchemaUri>,
        recursive_anchor: bool,
        dynamic_anchor: Option<String>,
    ) -> Self {
        self.id = id;
        self.recursive_anchor = recursive_anchor;
        self.dynamic_anchor = dynamic_anchor;
        self
    }

    fn own_flags(&self) -> EvalFlags {
        EvalFlags {
            properties: self.unevaluated_properties.is_some(),
            items: self.unevaluated_items.is_some(),
        }
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        if self.always_succeeds && !ctx.requires_evaluation() {
            return Outcome::Valid;
        }

        let caller_flags = ctx.flags();
        let inner = ctx.with_flags(self.own_flags());
        let mut local = EvaluationResults::default();
        let mut outcome = Outcome::Valid;

        let unevaluated = self
            .unevaluated_properties
            .iter()
            .chain(self.unevaluated_items.iter());
        for keyword in self.keywords.iter().chain(unevaluated) {
            match keyword.validate(&inner, instance, location, &mut local, reporter, patch) {
                Outcome::Abort => return Outcome::Abort,
                Outcome::Invalid => outcome = Outcome::Invalid,
                Outcome::Valid => {}
            }
        }

        results.merge(local, caller_flags);
        outcome
    }

    fn walk(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        let unevaluated = self
            .unevaluated_properties
            .iter()
            .chain(self.unevaluated_items.iter());
        for keyword in self.keywords.iter().chain(unevaluated) {
            if keyword.walk(ctx, instance, location, visitor) == WalkResult::Abort {
                return WalkResult::Abort;
            }
        }
        WalkResult::Advance
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<SchemaArena>();
    assert_sync::<SchemaArena>();
};
