//! Keywords that apply to any instance type: `type`, `enum` and `const`.

use serde_json::{Map, Value};

use crate::compiler::{CompilationContext, KeywordResult, SchemaFactory};
use crate::error::{ErrorReporter, SchemaError};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::{KeywordMeta, KeywordValidator};
use crate::validation::{EvalContext, EvaluationResults, Outcome};

/// The primitive types named by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(JsonType::Null),
            "boolean" => Some(JsonType::Boolean),
            "integer" => Some(JsonType::Integer),
            "number" => Some(JsonType::Number),
            "string" => Some(JsonType::String),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    /// Whether `value` has this type. Draft-04 does not count `1.0` as an integer.
    fn matches(self, value: &Value, strict_integers: bool) -> bool {
        match (self, value) {
            (JsonType::Null, Value::Null)
            | (JsonType::Boolean, Value::Bool(_))
            | (JsonType::Number, Value::Number(_))
            | (JsonType::String, Value::String(_))
            | (JsonType::Array, Value::Array(_))
            | (JsonType::Object, Value::Object(_)) => true,
            (JsonType::Integer, Value::Number(n)) => {
                n.is_i64()
                    || n.is_u64()
                    || (!strict_integers && n.as_f64().is_some_and(|f| f.fract() == 0.0))
            }
            _ => false,
        }
    }
}

/// Returns the JSON type name for a value.
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON equality where numbers compare by value, so `1` equals `1.0`.
pub(crate) fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => left == right,
    }
}

struct TypeValidator {
    meta: KeywordMeta,
    types: Vec<JsonType>,
    strict_integers: bool,
}

impl KeywordValidator for TypeValidator {
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
        if self
            .types
            .iter()
            .any(|ty| ty.matches(instance, self.strict_integers))
        {
            return Outcome::Valid;
        }
        let expected: Vec<_> = self.types.iter().map(|ty| ty.name()).collect();
        let text = format!(
            "expected {}, got {}",
            expected.join(" or "),
            value_type_name(instance)
        );
        self.meta.report(ctx, location, text, reporter)
    }

    fn always_fails(&self) -> bool {
        self.types.is_empty()
    }
}

fn make_type(ctx: &CompilationContext, value: &Value, strict_integers: bool) -> KeywordResult {
    let invalid = || {
        SchemaError::invalid_keyword(ctx.location(), "type", "a type name or an array of type names")
    };
    let names: Vec<&str> = match value {
        Value::String(name) => vec![name.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(invalid))
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid()),
    };
    let types = names
        .into_iter()
        .map(|name| JsonType::parse(name).ok_or_else(invalid))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Box::new(TypeValidator {
        meta: ctx.meta("type"),
        types,
        strict_integers,
    })))
}

pub(crate) fn compile_type(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_type(ctx, value, false)
}

pub(crate) fn compile_type_draft4(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    make_type(ctx, value, true)
}

struct EnumValidator {
    meta: KeywordMeta,
    options: Vec<Value>,
}

impl KeywordValidator for EnumValidator {
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
        if self.options.iter().any(|option| json_equal(option, instance)) {
            return Outcome::Valid;
        }
        let text = format!(
            "{} is not one of {}",
            instance,
            Value::Array(self.options.clone())
        );
        self.meta.report(ctx, location, text, reporter)
    }

    fn always_fails(&self) -> bool {
        self.options.is_empty()
    }
}

pub(crate) fn compile_enum(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let Value::Array(options) = value else {
        return Err(SchemaError::invalid_keyword(ctx.location(), "enum", "an array"));
    };
    Ok(Some(Box::new(EnumValidator {
        meta: ctx.meta("enum"),
        options: options.clone(),
    })))
}

struct ConstValidator {
    meta: KeywordMeta,
    expected: Value,
}

impl KeywordValidator for ConstValidator {
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
        if json_equal(&self.expected, instance) {
            Outcome::Valid
        } else {
            let text = format!("must equal {}, got {}", self.expected, instance);
            self.meta.report(ctx, location, text, reporter)
        }
    }
}

pub(crate) fn compile_const(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(ConstValidator {
        meta: ctx.meta("const"),
        expected: value.clone(),
    })))
}
