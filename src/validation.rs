//! Evaluation state threaded through validation.
//!
//! This module provides the runtime protocol shared by every compiled node:
//! - [`EvalContext`]: an immutable per-call snapshot carrying the compiled
//!   arena, the evaluation path, the dynamic scope, the active evaluation
//!   flags and the reference depth
//! - [`EvaluationResults`]: the property names and item indices claimed so far,
//!   read by `unevaluatedProperties` and `unevaluatedItems`
//! - [`Outcome`] and [`WalkResult`]: the result of validating or walking a node
//!
//! Contexts are derived, never mutated: entering a keyword or a child node
//! produces a new context, so sibling keywords always observe the same state.

use indexmap::IndexSet;
use serde_json::Value;

use crate::error::ErrorReporter;
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::{NodeId, SchemaArena};
use crate::walk::SchemaVisitor;

/// Whether a traversal should continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkResult {
    /// Keep going.
    Advance,
    /// Stop as soon as possible.
    Abort,
}

/// The result of validating one keyword or node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The instance satisfies the keyword.
    Valid,
    /// The instance violates the keyword; messages were reported.
    Invalid,
    /// The reporter asked to stop.
    Abort,
}

impl Outcome {
    /// Returns true for [`Outcome::Valid`].
    pub fn is_valid(self) -> bool {
        self == Outcome::Valid
    }

    /// Combines two outcomes; abort dominates, then failure.
    pub fn and(self, other: Outcome) -> Outcome {
        match (self, other) {
            (Outcome::Abort, _) | (_, Outcome::Abort) => Outcome::Abort,
            (Outcome::Invalid, _) | (_, Outcome::Invalid) => Outcome::Invalid,
            _ => Outcome::Valid,
        }
    }

    /// Maps a reporter's answer to the outcome of a failed keyword.
    pub(crate) fn reported(result: WalkResult) -> Outcome {
        match result {
            WalkResult::Advance => Outcome::Invalid,
            WalkResult::Abort => Outcome::Abort,
        }
    }
}

/// Which claimed-member sets the current evaluation must collect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalFlags {
    /// Collect evaluated property names.
    pub properties: bool,
    /// Collect evaluated item indices.
    pub items: bool,
}

impl EvalFlags {
    /// Returns the union of both flag sets.
    pub fn union(self, other: EvalFlags) -> EvalFlags {
        EvalFlags {
            properties: self.properties || other.properties,
            items: self.items || other.items,
        }
    }

    /// Returns true if any set is being collected.
    pub fn any(self) -> bool {
        self.properties || self.items
    }
}

/// Instance members claimed by keywords during one node's evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationResults {
    evaluated_properties: IndexSet<String>,
    evaluated_items: IndexSet<usize>,
}

impl EvaluationResults {
    /// Records that a property has been evaluated.
    pub fn claim_property(&mut self, name: &str) {
        if !self.evaluated_properties.contains(name) {
            self.evaluated_properties.insert(name.to_string());
        }
    }

    /// Records that an array item has been evaluated.
    pub fn claim_item(&mut self, index: usize) {
        self.evaluated_items.insert(index);
    }

    /// Returns true if the property was claimed.
    pub fn is_property_evaluated(&self, name: &str) -> bool {
        self.evaluated_properties.contains(name)
    }

    /// Returns true if the item was claimed.
    pub fn is_item_evaluated(&self, index: usize) -> bool {
        self.evaluated_items.contains(&index)
    }

    /// Returns the claimed property names in claim order.
    pub fn evaluated_properties(&self) -> impl Iterator<Item = &str> {
        self.evaluated_properties.iter().map(String::as_str)
    }

    /// Returns the claimed item indices in claim order.
    pub fn evaluated_items(&self) -> impl Iterator<Item = usize> + '_ {
        self.evaluated_items.iter().copied()
    }

    /// Moves the sets selected by `flags` from `other` into `self`.
    pub fn merge(&mut self, other: EvaluationResults, flags: EvalFlags) {
        if flags.properties {
            self.evaluated_properties.extend(other.evaluated_properties);
        }
        if flags.items {
            self.evaluated_items.extend(other.evaluated_items);
        }
    }
}

/// One schema resource on the dynamic scope chain.
struct ScopeFrame<'a> {
    node: NodeId,
    parent: Option<&'a ScopeFrame<'a>>,
}

/// Per-call evaluation snapshot.
///
/// `EvalContext` plays the role of a registry handle plus bookkeeping: it
/// lets keywords reach the nodes they reference, tracks how deep the
/// reference chain is, and remembers which schema resources were entered
/// (the dynamic scope) so `$dynamicRef` and `$recursiveRef` can find the
/// outermost matching anchor.
#[derive(Clone)]
pub struct EvalContext<'a> {
    arena: &'a SchemaArena,
    scope: Option<&'a ScopeFrame<'a>>,
    eval_path: JsonPointer,
    flags: EvalFlags,
    depth: usize,
    max_depth: usize,
}

impl<'a> EvalContext<'a> {
    /// Creates a root context over a compiled arena.
    pub(crate) fn new(arena: &'a SchemaArena, max_depth: usize) -> Self {
        Self {
            arena,
            scope: None,
            eval_path: JsonPointer::root(),
            flags: EvalFlags::default(),
            depth: 0,
            max_depth,
        }
    }

    /// Returns the compiled arena.
    pub fn arena(&self) -> &'a SchemaArena {
        self.arena
    }

    /// Returns the keyword path from the root schema.
    pub fn eval_path(&self) -> &JsonPointer {
        &self.eval_path
    }

    /// Returns the active evaluation flags.
    pub fn flags(&self) -> EvalFlags {
        self.flags
    }

    /// Returns true if property claims must be recorded.
    pub fn requires_evaluated_properties(&self) -> bool {
        self.flags.properties
    }

    /// Returns true if item claims must be recorded.
    pub fn requires_evaluated_items(&self) -> bool {
        self.flags.items
    }

    /// Returns true if any claims must be recorded.
    pub fn requires_evaluation(&self) -> bool {
        self.flags.any()
    }

    /// Returns the number of references followed so far.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the maximum allowed reference depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Derives a context one path segment deeper, keeping the flags.
    pub fn member(&self, name: &str) -> Self {
        Self {
            eval_path: self.eval_path.push_field(name),
            ..self.clone()
        }
    }

    /// Derives a context one index deeper, keeping the flags.
    pub fn index(&self, index: usize) -> Self {
        Self {
            eval_path: self.eval_path.push_index(index),
            ..self.clone()
        }
    }

    /// Derives a context for a different instance value; claims do not carry over.
    pub fn without_evaluation(self) -> Self {
        Self {
            flags: EvalFlags::default(),
            ..self
        }
    }

    /// Derives a context that additionally collects the given sets.
    pub fn with_flags(&self, flags: EvalFlags) -> Self {
        Self {
            flags: self.flags.union(flags),
            ..self.clone()
        }
    }

    /// Derives a context for following a reference keyword.
    pub fn follow_reference(&self, keyword: &str) -> Self {
        Self {
            eval_path: self.eval_path.push_field(keyword),
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    /// Validates `instance` against the node `id`.
    ///
    /// Entering a schema resource pushes it onto the dynamic scope for the
    /// duration of the call.
    pub fn evaluate(
        &self,
        id: NodeId,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        let node = self.arena.node(id);
        if node.is_resource() {
            let frame = ScopeFrame {
                node: id,
                parent: self.scope,
            };
            let scoped = self.with_scope(&frame);
            node.validate(&scoped, instance, location, results, reporter, patch)
        } else {
            node.validate(self, instance, location, results, reporter, patch)
        }
    }

    /// Walks `instance` through the node `id` without enforcing pass/fail.
    pub fn walk_node(
        &self,
        id: NodeId,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        let node = self.arena.node(id);
        if node.is_resource() {
            let frame = ScopeFrame {
                node: id,
                parent: self.scope,
            };
            let scoped = self.with_scope(&frame);
            node.walk(&scoped, instance, location, visitor)
        } else {
            node.walk(self, instance, location, visitor)
        }
    }

    /// Validates the node `id` after entering `resource`, the schema resource
    /// a reference passed through to reach a non-resource target.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_within(
        &self,
        resource: NodeId,
        id: NodeId,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome {
        let frame = ScopeFrame {
            node: resource,
            parent: self.scope,
        };
        self.with_scope(&frame)
            .evaluate(id, instance, location, results, reporter, patch)
    }

    /// Walks the node `id` after entering `resource`.
    pub fn walk_within(
        &self,
        resource: NodeId,
        id: NodeId,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        let frame = ScopeFrame {
            node: resource,
            parent: self.scope,
        };
        self.with_scope(&frame)
            .walk_node(id, instance, location, visitor)
    }

    /// Finds the outermost resource on the dynamic scope declaring `$dynamicAnchor: name`.
    pub fn dynamic_anchor_target(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        let mut frame = self.scope;
        while let Some(current) = frame {
            if let Some(target) = self.arena.node(current.node).dynamic_anchor_in_resource(name) {
                found = Some(target);
            }
            frame = current.parent;
        }
        found
    }

    /// Finds the outermost resource on the dynamic scope with `$recursiveAnchor: true`.
    pub fn recursive_anchor_target(&self) -> Option<NodeId> {
        let mut found = None;
        let mut frame = self.scope;
        while let Some(current) = frame {
            if self.arena.node(current.node).recursive_anchor() {
                found = Some(current.node);
            }
            frame = current.parent;
        }
        found
    }

    fn with_scope<'b>(&'b self, frame: &'b ScopeFrame<'b>) -> EvalContext<'b> {
        EvalContext {
            arena: self.arena,
            scope: Some(frame),
            eval_path: self.eval_path.clone(),
            flags: self.flags,
            depth: self.depth,
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_union() {
        let props = EvalFlags {
            properties: true,
            items: false,
        };
        let items = EvalFlags {
            properties: false,
            items: true,
        };
        let both = props.union(items);
        assert!(both.properties && both.items);
        assert!(!EvalFlags::default().any());
    }

    #[test]
    fn test_results_merge_respects_flags() {
        let mut parent = EvaluationResults::default();
        let mut child = EvaluationResults::default();
        child.claim_property("a");
        child.claim_item(3);

        parent.merge(
            child.clone(),
            EvalFlags {
                properties: true,
                items: false,
            },
        );
        assert!(parent.is_property_evaluated("a"));
        assert!(!parent.is_item_evaluated(3));

        parent.merge(
            child,
            EvalFlags {
                properties: false,
                items: true,
            },
        );
        assert!(parent.is_item_evaluated(3));
    }

    #[test]
    fn test_claims_are_deduplicated() {
        let mut results = EvaluationResults::default();
        results.claim_property("a");
        results.claim_property("a");
        results.claim_item(1);
        results.claim_item(1);
        assert_eq!(results.evaluated_properties().count(), 1);
        assert_eq!(results.evaluated_items().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_outcome_from_report() {
        assert_eq!(Outcome::reported(WalkResult::Advance), Outcome::Invalid);
        assert_eq!(Outcome::reported(WalkResult::Abort), Outcome::Abort);
        assert!(Outcome::Valid.is_valid());
        assert_eq!(Outcome::Valid.and(Outcome::Invalid), Outcome::Invalid);
        assert_eq!(Outcome::Invalid.and(Outcome::Abort), Outcome::Abort);
        assert_eq!(Outcome::Valid.and(Outcome::Valid), Outcome::Valid);
    }
}
