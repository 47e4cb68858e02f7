//! Combinators: `allOf`, `anyOf`, `oneOf`, `not` and `if`/`then`/`else`.
//!
//! `allOf` and the chosen `then`/`else` branch report straight to the caller's
//! reporter. The other combinators evaluate their branches silently and
//! decide afterwards what the branch failures mean; claims and default
//! patches are kept only from branches that passed.

use serde_json::{Map, Value};

use crate::compiler::{CompilationContext, KeywordResult, SchemaFactory};
use crate::error::{ErrorReporter, ValidationMessage};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::{
    compile_schema_array, compile_subschema, evaluate_silently, Branch, KeywordMeta,
    KeywordValidator, NodeId,
};
use crate::validation::{EvalContext, EvaluationResults, Outcome, WalkResult};
use crate::walk::SchemaVisitor;

fn walk_children(
    ctx: &EvalContext<'_>,
    keyword: &str,
    nodes: &[NodeId],
    instance: &Value,
    location: &JsonPointer,
    visitor: &mut dyn SchemaVisitor,
) -> WalkResult {
    let keyword_ctx = ctx.member(keyword);
    for (index, node) in nodes.iter().enumerate() {
        let step = keyword_ctx
            .index(index)
            .walk_node(*node, instance, location, visitor);
        if step == WalkResult::Abort {
            return WalkResult::Abort;
        }
    }
    WalkResult::Advance
}

/// Keeps the claims and patch of a branch that passed.
fn absorb(
    ctx: &EvalContext<'_>,
    branch: Branch,
    results: &mut EvaluationResults,
    patch: &mut Patch,
) {
    results.merge(branch.results, ctx.flags());
    patch.extend(branch.patch);
}

struct AllOfValidator {
    meta: KeywordMeta,
    nodes: Vec<NodeId>,
    always_succeeds: bool,
    always_fails: bool,
}

impl KeywordValidator for AllOfValidator {
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
        let keyword_ctx = ctx.member("allOf");
        let mut outcome = Outcome::Valid;
        for (index, node) in self.nodes.iter().enumerate() {
            let step = keyword_ctx
                .index(index)
                .evaluate(*node, instance, location, results, reporter, patch);
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }
        outcome
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
        walk_children(ctx, "allOf", &self.nodes, instance, location, visitor)
    }

    fn always_succeeds(&self) -> bool {
        self.always_succeeds
    }

    fn always_fails(&self) -> bool {
        self.always_fails
    }
}

pub(crate) fn compile_all_of(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let nodes = compile_schema_array(factory, ctx, "allOf", value)?;
    let always_succeeds = nodes.iter().all(|id| factory.node(*id).always_succeeds());
    let always_fails = nodes.iter().any(|id| factory.node(*id).always_fails());
    Ok(Some(Box::new(AllOfValidator {
        meta: ctx.meta("allOf"),
        nodes,
        always_succeeds,
        always_fails,
    })))
}

struct AnyOfValidator {
    meta: KeywordMeta,
    nodes: Vec<NodeId>,
}

impl KeywordValidator for AnyOfValidator {
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
        let keyword_ctx = ctx.member("anyOf");
        let mut matched = false;
        let mut details = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let branch = evaluate_silently(&keyword_ctx.index(index), *node, instance, location);
            if branch.is_valid() {
                matched = true;
                absorb(ctx, branch, results, patch);
                // later branches can only add claims
                if !ctx.requires_evaluation() {
                    break;
                }
            } else {
                details.extend(branch.messages);
            }
        }
        if matched {
            return Outcome::Valid;
        }
        let text = format!("value did not match any of {} schemas", self.nodes.len());
        let message = self.meta.message(ctx, location, text).with_details(details);
        Outcome::reported(reporter.error(message))
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
        let keyword_ctx = ctx.member("anyOf");
        for (index, node) in self.nodes.iter().enumerate() {
            let branch_ctx = keyword_ctx.index(index);
            if !evaluate_silently(&branch_ctx, *node, instance, location).is_valid() {
                continue;
            }
            if branch_ctx.walk_node(*node, instance, location, visitor) == WalkResult::Abort {
                return WalkResult::Abort;
            }
        }
        WalkResult::Advance
    }

    fn always_fails(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub(crate) fn compile_any_of(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(AnyOfValidator {
        meta: ctx.meta("anyOf"),
        nodes: compile_schema_array(factory, ctx, "anyOf", value)?,
    })))
}

struct OneOfValidator {
    meta: KeywordMeta,
    nodes: Vec<NodeId>,
}

impl OneOfValidator {
    fn branches(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
    ) -> Vec<Branch> {
        let keyword_ctx = ctx.member("oneOf");
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                evaluate_silently(&keyword_ctx.index(index), *node, instance, location)
            })
            .collect()
    }
}

impl KeywordValidator for OneOfValidator {
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
        let branches = self.branches(ctx, instance, location);
        let valid: Vec<usize> = branches
            .iter()
            .enumerate()
            .filter(|(_, branch)| branch.is_valid())
            .map(|(index, _)| index)
            .collect();

        match valid.as_slice() {
            [index] => {
                if let Some(branch) = branches.into_iter().nth(*index) {
                    absorb(ctx, branch, results, patch);
                }
                Outcome::Valid
            }
            [] => {
                let details: Vec<ValidationMessage> = branches
                    .into_iter()
                    .flat_map(|branch| branch.messages)
                    .collect();
                let text = format!("value did not match any of {} schemas", self.nodes.len());
                let message = self.meta.message(ctx, location, text).with_details(details);
                Outcome::reported(reporter.error(message))
            }
            _ => {
                let text = format!("value matched more than one schema (indices {:?})", valid);
                self.meta.report(ctx, location, text, reporter)
            }
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
        let branches = self.branches(ctx, instance, location);
        let mut valid = branches
            .iter()
            .enumerate()
            .filter(|(_, branch)| branch.is_valid());
        match (valid.next(), valid.next()) {
            (Some((index, _)), None) => {
                let node = self.nodes[index];
                ctx.member("oneOf")
                    .index(index)
                    .walk_node(node, instance, location, visitor)
            }
            _ => WalkResult::Advance,
        }
    }

    fn always_fails(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub(crate) fn compile_one_of(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(OneOfValidator {
        meta: ctx.meta("oneOf"),
        nodes: compile_schema_array(factory, ctx, "oneOf", value)?,
    })))
}

struct NotValidator {
    meta: KeywordMeta,
    node: NodeId,
    always_succeeds: bool,
    always_fails: bool,
}

impl KeywordValidator for NotValidator {
    fn meta(&self) -> &KeywordMeta {
        &self.meta
    }

    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        _results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        _patch: &mut Patch,
    ) -> Outcome {
        let keyword_ctx = ctx.member("not").without_evaluation();
        if evaluate_silently(&keyword_ctx, self.node, instance, location).is_valid() {
            self.meta
                .report(ctx, location, "value must not match the schema", reporter)
        } else {
            Outcome::Valid
        }
    }

    fn always_succeeds(&self) -> bool {
        self.always_succeeds
    }

    fn always_fails(&self) -> bool {
        self.always_fails
    }
}

pub(crate) fn compile_not(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let node = compile_subschema(factory, ctx, "not", value)?;
    Ok(Some(Box::new(NotValidator {
        meta: ctx.meta("not"),
        node,
        always_succeeds: factory.node(node).always_fails(),
        always_fails: factory.node(node).always_succeeds(),
    })))
}

/// `if` with its `then` and `else` siblings.
struct ConditionalValidator {
    meta: KeywordMeta,
    condition: NodeId,
    then_branch: Option<NodeId>,
    else_branch: Option<NodeId>,
}

impl ConditionalValidator {
    fn chosen(&self, matched: bool) -> Option<(&'static str, NodeId)> {
        if matched {
            self.then_branch.map(|node| ("then", node))
        } else {
            self.else_branch.map(|node| ("else", node))
        }
    }
}

impl KeywordValidator for ConditionalValidator {
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
        let condition = evaluate_silently(&ctx.member("if"), self.condition, instance, location);
        let matched = condition.is_valid();
        if matched {
            absorb(ctx, condition, results, patch);
        }
        match self.chosen(matched) {
            Some((keyword, node)) => {
                ctx.member(keyword)
                    .evaluate(node, instance, location, results, reporter, patch)
            }
            None => Outcome::Valid,
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
        let if_ctx = ctx.member("if");
        if if_ctx.walk_node(self.condition, instance, location, visitor) == WalkResult::Abort {
            return WalkResult::Abort;
        }
        let matched = evaluate_silently(&if_ctx, self.condition, instance, location).is_valid();
        match self.chosen(matched) {
            Some((keyword, node)) => ctx
                .member(keyword)
                .walk_node(node, instance, location, visitor),
            None => WalkResult::Advance,
        }
    }
}

/// Compiles `if` together with `then`/`else`; without either branch `if` has no effect.
pub(crate) fn compile_if(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    if !schema.contains_key("then") && !schema.contains_key("else") {
        factory.keep_unused(ctx, "if", value);
        return Ok(None);
    }
    let condition = compile_subschema(factory, ctx, "if", value)?;
    let then_branch = match schema.get("then") {
        Some(then) => Some(compile_subschema(factory, ctx, "then", then)?),
        None => None,
    };
    let else_branch = match schema.get("else") {
        Some(otherwise) => Some(compile_subschema(factory, ctx, "else", otherwise)?),
        None => None,
    };
    Ok(Some(Box::new(ConditionalValidator {
        meta: ctx.meta("if"),
        condition,
        then_branch,
        else_branch,
    })))
}

/// `then` is compiled by `if`; alone it has no effect.
pub(crate) fn compile_then(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    if !schema.contains_key("if") {
        factory.keep_unused(ctx, "then", value);
    }
    Ok(None)
}

/// `else` is compiled by `if`; alone it has no effect.
pub(crate) fn compile_else(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    if !schema.contains_key("if") {
        factory.keep_unused(ctx, "else", value);
    }
    Ok(None)
}
