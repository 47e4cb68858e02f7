//! Reference keywords: `$ref`, `$dynamicRef` and `$recursiveRef`.
//!
//! A reference compiles to a slot in the arena that stays empty until the
//! late-binding pass, so forward and cyclic references need no special
//! handling. Dynamic references resolve statically first and then consult
//! the dynamic scope at validation time:
//!
//! - `$dynamicRef: "#name"` moves to the outermost resource on the scope that
//!   declares `$dynamicAnchor: "name"`, provided the static target declares
//!   the same anchor
//! - `$recursiveRef: "#"` moves to the outermost resource with
//!   `$recursiveAnchor: true`, provided the static target has it too
//!
//! Following a reference increments the reference depth; past
//! [`Options::max_depth`](crate::Options) the reference reports instead of
//! recursing.

use serde_json::{Map, Value};

use crate::compiler::{CompilationContext, KeywordResult, SchemaFactory};
use crate::error::{ErrorReporter, SchemaError};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::{KeywordMeta, KeywordValidator, NodeId, RefId};
use crate::uri::SchemaUri;
use crate::validation::{EvalContext, EvaluationResults, Outcome, WalkResult};
use crate::walk::SchemaVisitor;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RefKind {
    Static,
    Dynamic { anchor: Option<String> },
    Recursive,
}

struct RefValidator {
    meta: KeywordMeta,
    slot: RefId,
    kind: RefKind,
}

impl RefValidator {
    /// The node to evaluate, after applying dynamic scope rules.
    fn target(&self, ctx: &EvalContext<'_>) -> Option<NodeId> {
        let target = ctx.arena().reference(self.slot).target()?;
        let node = ctx.arena().node(target);
        let dynamic = match &self.kind {
            RefKind::Static | RefKind::Dynamic { anchor: None } => None,
            RefKind::Dynamic { anchor: Some(name) } => {
                if node.dynamic_anchor() == Some(name.as_str()) {
                    ctx.dynamic_anchor_target(name)
                } else {
                    None
                }
            }
            RefKind::Recursive => {
                if node.recursive_anchor() {
                    ctx.recursive_anchor_target()
                } else {
                    None
                }
            }
        };
        Some(dynamic.unwrap_or(target))
    }

    /// The resource behind the static target, which joins the dynamic scope
    /// even though only a subschema of it is evaluated.
    fn entered_resource(&self, ctx: &EvalContext<'_>, target: NodeId) -> Option<NodeId> {
        let slot = ctx.arena().reference(self.slot);
        if slot.target() == Some(target) {
            slot.resource()
        } else {
            None
        }
    }
}

impl KeywordValidator for RefValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
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
        // checked before resolving so reference cycles terminate
        if ctx.depth() >= ctx.max_depth() {
            let text = format!(
                "maximum reference depth {} exceeded at path '{}'",
                ctx.max_depth(),
                location
            );
            return self.meta.report(ctx, location, text, reporter);
        }
        let Some(target) = self.target(ctx) else {
            let uri = ctx.arena().reference(self.slot).uri();
            let text = format!("unresolved reference '{}'", uri);
            return self.meta.report(ctx, location, text, reporter);
        };
        let ctx = ctx.follow_reference(self.meta.keyword());
        match self.entered_resource(&ctx, target) {
            Some(resource) => {
                ctx.evaluate_within(resource, target, instance, location, results, reporter, patch)
            }
            None => ctx.evaluate(target, instance, location, results, reporter, patch),
        }
    }

    fn walk(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        if visitor.visit(&self.meta.event(ctx, instance, location)) == WalkResult::Abort {
            return WalkResult::Abort;
        }
        if ctx.depth() >= ctx.max_depth() {
            return WalkResult::Advance;
        }
        let Some(target) = self.target(ctx) else {
            return WalkResult::Advance;
        };
        let ctx = ctx.follow_reference(self.meta.keyword());
        match self.entered_resource(&ctx, target) {
            Some(resource) => ctx.walk_within(resource, target, instance, location, visitor),
            None => ctx.walk_node(target, instance, location, visitor),
        }
    }
}

fn make_reference(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    keyword: &'static str,
    value: &Value,
    kind: impl FnOnce(&SchemaUri) -> RefKind,
) -> KeywordResult {
    let Value::String(raw) = value else {
        return Err(SchemaError::invalid_keyword(
            ctx.location(),
            keyword,
            "a URI reference string",
        ));
    };
    let uri = ctx.base().resolve(raw).map_err(|source| SchemaError::InvalidUri {
        uri: raw.clone(),
        source,
    })?;
    let kind = kind(&uri);
    let slot = factory.reference(uri, ctx.draft());
    Ok(Some(Box::new(RefValidator {
        meta: ctx.meta(keyword),
        slot,
        kind,
    })))
}

pub(crate) fn compile_ref(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_reference(factory, ctx, "$ref", value, |_| RefKind::Static)
}

pub(crate) fn compile_dynamic_ref(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_reference(factory, ctx, "$dynamicRef", value, |uri| RefKind::Dynamic {
        anchor: uri.has_plain_name_fragment().then(|| uri.fragment()),
    })
}

pub(crate) fn compile_recursive_ref(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_reference(factory, ctx, "$recursiveRef", value, |_| RefKind::Recursive)
}
