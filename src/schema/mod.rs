//! Compiled schema nodes and keyword validators.
//!
//! A compiled schema is a tree of [`SchemaNode`]s stored in a flat
//! [`SchemaArena`]. Object nodes hold a list of [`KeywordValidator`]s, one per
//! constraining keyword, and validate an instance by running them in
//! declaration order.
//!
//! Keyword constructors live next to the validators they build; the
//! per-dialect keyword tables in [`crate::compiler`] point at them.

pub(crate) mod array;
pub(crate) mod combinators;
pub(crate) mod generic;
mod node;
pub(crate) mod numeric;
pub(crate) mod object;
pub(crate) mod ref_schema;
pub(crate) mod string;
mod traits;

pub use node::{BooleanNode, NodeId, ObjectNode, RefId, ReferenceSlot, SchemaArena, SchemaNode};
pub use traits::{KeywordMeta, KeywordValidator};

use serde_json::Value;

use crate::compiler::{CompilationContext, SchemaFactory};
use crate::error::{CollectingReporter, SchemaError, ValidationMessage};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::validation::{EvalContext, EvaluationResults, Outcome};

/// The result of evaluating a subschema without reporting to the caller.
pub(crate) struct Branch {
    pub(crate) outcome: Outcome,
    pub(crate) results: EvaluationResults,
    pub(crate) patch: Patch,
    pub(crate) messages: Vec<ValidationMessage>,
}

impl Branch {
    pub(crate) fn is_valid(&self) -> bool {
        self.outcome.is_valid()
    }
}

/// Evaluates `node` into a private reporter so the caller can decide what
/// the branch's failures mean.
pub(crate) fn evaluate_silently(
    ctx: &EvalContext<'_>,
    node: NodeId,
    instance: &Value,
    location: &JsonPointer,
) -> Branch {
    let mut results = EvaluationResults::default();
    let mut patch = Patch::new();
    let mut reporter = CollectingReporter::new();
    let outcome = ctx.evaluate(node, instance, location, &mut results, &mut reporter, &mut patch);
    Branch {
        outcome,
        results,
        patch,
        messages: reporter.into_messages(),
    }
}

/// Reads a non-negative integer operand; integral floats such as `2.0` are accepted.
pub(crate) fn non_negative_integer(
    ctx: &CompilationContext,
    keyword: &str,
    value: &Value,
) -> Result<u64, SchemaError> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        })
        .ok_or_else(|| {
            SchemaError::invalid_keyword(ctx.location(), keyword, "a non-negative integer")
        })
}

/// Compiles a keyword whose value is a single schema.
pub(crate) fn compile_subschema(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    keyword: &str,
    value: &Value,
) -> Result<NodeId, SchemaError> {
    factory.make_schema_validator(ctx, value, &[keyword])
}

/// Compiles a keyword whose value is an array of schemas.
pub(crate) fn compile_schema_array(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    keyword: &str,
    value: &Value,
) -> Result<Vec<NodeId>, SchemaError> {
    let Value::Array(items) = value else {
        return Err(SchemaError::invalid_keyword(
            ctx.location(),
            keyword,
            "an array of schemas",
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let key = index.to_string();
            factory.make_schema_validator(ctx, item, &[keyword, key.as_str()])
        })
        .collect()
}

/// Compiles a keyword whose value is an object of named schemas.
pub(crate) fn compile_schema_map(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    keyword: &str,
    value: &Value,
) -> Result<Vec<(String, NodeId)>, SchemaError> {
    let Value::Object(entries) = value else {
        return Err(SchemaError::invalid_keyword(
            ctx.location(),
            keyword,
            "an object of schemas",
        ));
    };
    entries
        .iter()
        .map(|(name, schema)| {
            factory
                .make_schema_validator(ctx, schema, &[keyword, name.as_str()])
                .map(|id| (name.clone(), id))
        })
        .collect()
}

/// Returns the string members of an array operand.
pub(crate) fn string_array(
    ctx: &CompilationContext,
    keyword: &str,
    value: &Value,
) -> Result<Vec<String>, SchemaError> {
    let invalid = || SchemaError::invalid_keyword(ctx.location(), keyword, "an array of strings");
    let Value::Array(items) = value else {
        return Err(invalid());
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

