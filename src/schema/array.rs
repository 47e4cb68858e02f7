//! Array keywords.
//!
//! Positional and uniform item schemas share one validator: a list of prefix
//! schemas plus an optional schema for the remaining items. That covers
//! draft-04/07/2019-09 `items` (with `additionalItems`) and 2020-12
//! `prefixItems` (with `items`).
//!
//! Which keywords claim item indices differs per dialect: `contains` claims
//! matching items only in 2020-12.

use serde_json::{Map, Value};

use crate::compiler::{CompilationContext, KeywordResult, SchemaFactory};
use crate::error::{ErrorReporter, SchemaError};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::generic::json_equal;
use crate::schema::{
    compile_schema_array, compile_subschema, evaluate_silently, non_negative_integer,
    KeywordMeta, KeywordValidator, NodeId,
};
use crate::validation::{EvalContext, EvaluationResults, Outcome, WalkResult};
use crate::walk::SchemaVisitor;

/// The schema applied to every item past the prefix.
struct RestItems {
    meta: KeywordMeta,
    node: NodeId,
    always_fails: bool,
}

struct ItemsValidator {
    meta: KeywordMeta,
    prefix: Vec<NodeId>,
    rest: Option<RestItems>,
    always_succeeds: bool,
}

impl ItemsValidator {
    fn new(
        factory: &SchemaFactory,
        meta: KeywordMeta,
        prefix: Vec<NodeId>,
        rest: Option<(KeywordMeta, NodeId)>,
    ) -> Self {
        let rest = rest.map(|(meta, node)| RestItems {
            meta,
            node,
            always_fails: factory.node(node).always_fails(),
        });
        let always_succeeds = prefix.iter().all(|id| factory.node(*id).always_succeeds())
            && rest
                .as_ref()
                .map_or(true, |rest| factory.node(rest.node).always_succeeds());
        Self {
            meta,
            prefix,
            rest,
            always_succeeds,
        }
    }

    fn rejection(&self, index: usize) -> String {
        if self.prefix.is_empty() {
            format!("item at index {} is not allowed", index)
        } else {
            format!("additional item at index {} is not allowed", index)
        }
    }
}

impl KeywordValidator for ItemsValidator {
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
        let Value::Array(items) = instance else {
            return Outcome::Valid;
        };
        let claim = ctx.requires_evaluated_items();
        if self.always_succeeds && !claim {
            return Outcome::Valid;
        }

        let mut outcome = Outcome::Valid;
        let prefix_ctx = ctx.member(self.meta.keyword()).without_evaluation();
        for (index, (item, node)) in items.iter().zip(&self.prefix).enumerate() {
            if claim {
                results.claim_item(index);
            }
            let step = prefix_ctx.index(index).evaluate(
                *node,
                item,
                &location.push_index(index),
                &mut EvaluationResults::default(),
                reporter,
                patch,
            );
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }

        let Some(rest) = &self.rest else {
            return outcome;
        };
        let rest_ctx = ctx.member(rest.meta.keyword()).without_evaluation();
        for (index, item) in items.iter().enumerate().skip(self.prefix.len()) {
            if claim {
                results.claim_item(index);
            }
            let item_location = location.push_index(index);
            let step = if rest.always_fails {
                rest.meta.report(ctx, &item_location, self.rejection(index), reporter)
            } else {
                rest_ctx.evaluate(
                    rest.node,
                    item,
                    &item_location,
                    &mut EvaluationResults::default(),
                    reporter,
                    patch,
                )
            };
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
        let Value::Array(items) = instance else {
            return WalkResult::Advance;
        };
        let prefix_ctx = ctx.member(self.meta.keyword());
        for (index, (item, node)) in items.iter().zip(&self.prefix).enumerate() {
            let item_location = location.push_index(index);
            if prefix_ctx.index(index).walk_node(*node, item, &item_location, visitor)
                == WalkResult::Abort
            {
                return WalkResult::Abort;
            }
        }
        if let Some(rest) = &self.rest {
            let rest_ctx = ctx.member(rest.meta.keyword());
            for (index, item) in items.iter().enumerate().skip(self.prefix.len()) {
                let item_location = location.push_index(index);
                let step = rest_ctx.walk_node(rest.node, item, &item_location, visitor);
                if step == WalkResult::Abort {
                    return WalkResult::Abort;
                }
            }
        }
        WalkResult::Advance
    }

    fn always_succeeds(&self) -> bool {
        self.always_succeeds
    }
}

/// Draft-04 through 2019-09 `items`, reading `additionalItems` for the tuple form.
pub(crate) fn compile_items(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let validator = match value {
        Value::Array(_) => {
            let prefix = compile_schema_array(factory, ctx, "items", value)?;
            let rest = match schema.get("additionalItems") {
                Some(additional) => Some((
                    ctx.meta("additionalItems"),
                    compile_subschema(factory, ctx, "additionalItems", additional)?,
                )),
                None => None,
            };
            ItemsValidator::new(factory, ctx.meta("items"), prefix, rest)
        }
        _ => {
            let node = compile_subschema(factory, ctx, "items", value)?;
            let rest = Some((ctx.meta("items"), node));
            ItemsValidator::new(factory, ctx.meta("items"), Vec::new(), rest)
        }
    };
    Ok(Some(Box::new(validator)))
}

/// 2020-12 `prefixItems`, reading `items` for the remaining items.
pub(crate) fn compile_prefix_items(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let prefix = compile_schema_array(factory, ctx, "prefixItems", value)?;
    let rest = match schema.get("items") {
        Some(items) => Some((
            ctx.meta("items"),
            compile_subschema(factory, ctx, "items", items)?,
        )),
        None => None,
    };
    let validator = ItemsValidator::new(factory, ctx.meta("prefixItems"), prefix, rest);
    Ok(Some(Box::new(validator)))
}

/// 2020-12 `items`; with a `prefixItems` sibling it is compiled there instead.
pub(crate) fn compile_items_after_prefix(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    if schema.contains_key("prefixItems") {
        return Ok(None);
    }
    if value.is_array() {
        return Err(SchemaError::invalid_keyword(ctx.location(), "items", "a schema"));
    }
    let node = compile_subschema(factory, ctx, "items", value)?;
    let rest = Some((ctx.meta("items"), node));
    let validator = ItemsValidator::new(factory, ctx.meta("items"), Vec::new(), rest);
    Ok(Some(Box::new(validator)))
}

#[derive(Debug, Clone, Copy)]
enum CountBound {
    Max,
    Min,
}

struct ItemCountValidator {
    meta: KeywordMeta,
    limit: u64,
    bound: CountBound,
}

impl KeywordValidator for ItemCountValidator {
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
        let Value::Array(items) = instance else {
            return Outcome::Valid;
        };
        let len = items.len() as u64;
        match self.bound {
            CountBound::Max if len > self.limit => {
                let text = format!("array must have at most {} items, got {}", self.limit, len);
                self.meta.report(ctx, location, text, reporter)
            }
            CountBound::Min if len < self.limit => {
                let text = format!("array must have at least {} items, got {}", self.limit, len);
                self.meta.report(ctx, location, text, reporter)
            }
            _ => Outcome::Valid,
        }
    }

    fn always_succeeds(&self) -> bool {
        matches!(self.bound, CountBound::Min) && self.limit == 0
    }
}

pub(crate) fn compile_max_items(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(ItemCountValidator {
        meta: ctx.meta("maxItems"),
        limit: non_negative_integer(ctx, "maxItems", value)?,
        bound: CountBound::Max,
    })))
}

pub(crate) fn compile_min_items(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(ItemCountValidator {
        meta: ctx.meta("minItems"),
        limit: non_negative_integer(ctx, "minItems", value)?,
        bound: CountBound::Min,
    })))
}

struct UniqueItemsValidator {
    meta: KeywordMeta,
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    items.iter().enumerate().find_map(|(i, left)| {
        items[i + 1..]
            .iter()
            .position(|right| json_equal(left, right))
            .map(|offset| (i, i + 1 + offset))
    })
}

impl KeywordValidator for UniqueItemsValidator {
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
        let Value::Array(items) = instance else {
            return Outcome::Valid;
        };
        match first_duplicate(items) {
            Some((first, second)) => {
                let text = format!("duplicate value at indices {:?}", [first, second]);
                self.meta.report(ctx, location, text, reporter)
            }
            None => Outcome::Valid,
        }
    }
}

pub(crate) fn compile_unique_items(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    match value {
        Value::Bool(true) => Ok(Some(Box::new(UniqueItemsValidator {
            meta: ctx.meta("uniqueItems"),
        }))),
        Value::Bool(false) => Ok(None),
        _ => Err(SchemaError::invalid_keyword(ctx.location(), "uniqueItems", "a boolean")),
    }
}

struct ContainsValidator {
    meta: KeywordMeta,
    node: NodeId,
    min: u64,
    max: Option<u64>,
    claims: bool,
}

impl KeywordValidator for ContainsValidator {
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
        let Value::Array(items) = instance else {
            return Outcome::Valid;
        };
        let claim = self.claims && ctx.requires_evaluated_items();
        let child_ctx = ctx.member("contains").without_evaluation();

        let mut matched = 0u64;
        for (index, item) in items.iter().enumerate() {
            let item_location = location.push_index(index);
            let branch = evaluate_silently(&child_ctx, self.node, item, &item_location);
            if branch.is_valid() {
                matched += 1;
                patch.extend(branch.patch);
                if claim {
                    results.claim_item(index);
                }
            }
            if !claim && self.max.is_none() && matched >= self.min {
                break;
            }
        }

        if matched < self.min {
            let text = if self.min == 1 {
                "array does not contain a matching item".to_string()
            } else {
                format!(
                    "array must contain at least {} matching items, got {}",
                    self.min, matched
                )
            };
            return self.meta.report(ctx, location, text, reporter);
        }
        match self.max {
            Some(max) if matched > max => {
                let text = format!(
                    "array must contain at most {} matching items, got {}",
                    max, matched
                );
                self.meta.report(ctx, location, text, reporter)
            }
            _ => Outcome::Valid,
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
        let Value::Array(items) = instance else {
            return WalkResult::Advance;
        };
        let child_ctx = ctx.member("contains");
        for (index, item) in items.iter().enumerate() {
            if child_ctx.walk_node(self.node, item, &location.push_index(index), visitor)
                == WalkResult::Abort
            {
                return WalkResult::Abort;
            }
        }
        WalkResult::Advance
    }
}

fn make_contains(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
    counted: bool,
    claims: bool,
) -> KeywordResult {
    let node = compile_subschema(factory, ctx, "contains", value)?;
    let (min, max) = if counted {
        let min = match schema.get("minContains") {
            Some(value) => non_negative_integer(ctx, "minContains", value)?,
            None => 1,
        };
        let max = match schema.get("maxContains") {
            Some(value) => Some(non_negative_integer(ctx, "maxContains", value)?),
            None => None,
        };
        (min, max)
    } else {
        (1, None)
    };
    Ok(Some(Box::new(ContainsValidator {
        meta: ctx.meta("contains"),
        node,
        min,
        max,
        claims,
    })))
}

/// Draft-07 `contains`: at least one item matches.
pub(crate) fn compile_contains(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_contains(factory, ctx, schema, value, false, false)
}

/// 2019-09 `contains` with `minContains`/`maxContains`; matches are not claimed.
pub(crate) fn compile_contains_counted(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_contains(factory, ctx, schema, value, true, false)
}

/// 2020-12 `contains`; matching indices count as evaluated.
pub(crate) fn compile_contains_claiming(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_contains(factory, ctx, schema, value, true, true)
}

/// `unevaluatedItems`: applies to items no sibling keyword claimed.
struct UnevaluatedItemsValidator {
    meta: KeywordMeta,
    node: NodeId,
    always_fails: bool,
}

impl KeywordValidator for UnevaluatedItemsValidator {
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
        let Value::Array(items) = instance else {
            return Outcome::Valid;
        };
        let child_ctx = ctx.member("unevaluatedItems").without_evaluation();
        let mut outcome = Outcome::Valid;
        for (index, item) in items.iter().enumerate() {
            if results.is_item_evaluated(index) {
                continue;
            }
            let item_location = location.push_index(index);
            let step = if self.always_fails {
                let text = format!("unevaluated item at index {} is not allowed", index);
                self.meta.report(ctx, &item_location, text, reporter)
            } else {
                child_ctx.evaluate(
                    self.node,
                    item,
                    &item_location,
                    &mut EvaluationResults::default(),
                    reporter,
                    patch,
                )
            };
            results.claim_item(index);
            outcome = outcome.and(step);
            if outcome == Outcome::Abort {
                return Outcome::Abort;
            }
        }
        outcome
    }
}

pub(crate) fn compile_unevaluated_items(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    value: &Value,
) -> Result<Box<dyn KeywordValidator>, SchemaError> {
    let node = compile_subschema(factory, ctx, "unevaluatedItems", value)?;
    Ok(Box::new(UnevaluatedItemsValidator {
        meta: ctx.meta("unevaluatedItems"),
        node,
        always_fails: factory.node(node).always_fails(),
    }))
}
