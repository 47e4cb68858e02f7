//! Numeric keywords: `multipleOf` and the four bounds.
//!
//! Comparisons are exact when both sides are integers and fall back to `f64`
//! otherwise, so large integer limits do not lose precision.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::compiler::{CompilationContext, KeywordResult, SchemaFactory};
use crate::error::{ErrorReporter, SchemaError};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::{KeywordMeta, KeywordValidator};
use crate::validation::{EvalContext, EvaluationResults, Outcome};

fn as_integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

/// Orders `value` relative to `limit`; `None` only for non-finite floats.
fn compare(value: &Number, limit: &Number) -> Option<Ordering> {
    match (as_integer(value), as_integer(limit)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => value.as_f64()?.partial_cmp(&limit.as_f64()?),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Maximum,
    Minimum,
    ExclusiveMaximum,
    ExclusiveMinimum,
}

impl Bound {
    fn admits(self, ordering: Ordering) -> bool {
        match self {
            Bound::Maximum => ordering != Ordering::Greater,
            Bound::Minimum => ordering != Ordering::Less,
            Bound::ExclusiveMaximum => ordering == Ordering::Less,
            Bound::ExclusiveMinimum => ordering == Ordering::Greater,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Bound::Maximum => "greater than maximum",
            Bound::Minimum => "less than minimum",
            Bound::ExclusiveMaximum => "greater than or equal to exclusive maximum",
            Bound::ExclusiveMinimum => "less than or equal to exclusive minimum",
        }
    }
}

struct BoundValidator {
    meta: KeywordMeta,
    limit: Number,
    bound: Bound,
}

impl KeywordValidator for BoundValidator {
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
        let Value::Number(number) = instance else {
            return Outcome::Valid;
        };
        match compare(number, &self.limit) {
            Some(ordering) if self.bound.admits(ordering) => Outcome::Valid,
            _ => {
                let text = format!("{} is {} {}", number, self.bound.describe(), self.limit);
                self.meta.report(ctx, location, text, reporter)
            }
        }
    }
}

fn number_operand(
    ctx: &CompilationContext,
    keyword: &'static str,
    value: &Value,
) -> Result<Number, SchemaError> {
    match value {
        Value::Number(number) => Ok(number.clone()),
        _ => Err(SchemaError::invalid_keyword(ctx.location(), keyword, "a number")),
    }
}

fn make_bound(
    ctx: &CompilationContext,
    keyword: &'static str,
    value: &Value,
    bound: Bound,
) -> KeywordResult {
    Ok(Some(Box::new(BoundValidator {
        meta: ctx.meta(keyword),
        limit: number_operand(ctx, keyword, value)?,
        bound,
    })))
}

pub(crate) fn compile_maximum(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_bound(ctx, "maximum", value, Bound::Maximum)
}

pub(crate) fn compile_minimum(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_bound(ctx, "minimum", value, Bound::Minimum)
}

pub(crate) fn compile_exclusive_maximum(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_bound(ctx, "exclusiveMaximum", value, Bound::ExclusiveMaximum)
}

pub(crate) fn compile_exclusive_minimum(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_bound(ctx, "exclusiveMinimum", value, Bound::ExclusiveMinimum)
}

/// Reads a draft-04 boolean `exclusiveMaximum`/`exclusiveMinimum` flag.
fn exclusive_flag(
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    keyword: &'static str,
) -> Result<bool, SchemaError> {
    match schema.get(keyword) {
        None => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(SchemaError::invalid_keyword(ctx.location(), keyword, "a boolean")),
    }
}

pub(crate) fn compile_maximum_draft4(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let bound = if exclusive_flag(ctx, schema, "exclusiveMaximum")? {
        Bound::ExclusiveMaximum
    } else {
        Bound::Maximum
    };
    make_bound(ctx, "maximum", value, bound)
}

pub(crate) fn compile_minimum_draft4(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let bound = if exclusive_flag(ctx, schema, "exclusiveMinimum")? {
        Bound::ExclusiveMinimum
    } else {
        Bound::Minimum
    };
    make_bound(ctx, "minimum", value, bound)
}

struct MultipleOfValidator {
    meta: KeywordMeta,
    divisor: Number,
}

impl MultipleOfValidator {
    fn divides(&self, number: &Number) -> bool {
        if let (Some(value), Some(divisor)) = (as_integer(number), as_integer(&self.divisor)) {
            return value % divisor == 0;
        }
        let (Some(value), Some(divisor)) = (number.as_f64(), self.divisor.as_f64()) else {
            return false;
        };
        let quotient = value / divisor;
        if !quotient.is_finite() {
            return false;
        }
        (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
    }
}

impl KeywordValidator for MultipleOfValidator {
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
        match instance {
            Value::Number(number) if !self.divides(number) => {
                let text = format!("{} is not a multiple of {}", number, self.divisor);
                self.meta.report(ctx, location, text, reporter)
            }
            _ => Outcome::Valid,
        }
    }
}

pub(crate) fn compile_multiple_of(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let divisor = number_operand(ctx, "multipleOf", value)?;
    if divisor.as_f64().map_or(true, |d| d <= 0.0) {
        return Err(SchemaError::invalid_keyword(
            ctx.location(),
            "multipleOf",
            "a number greater than zero",
        ));
    }
    Ok(Some(Box::new(MultipleOfValidator {
        meta: ctx.meta("multipleOf"),
        divisor,
    })))
}
