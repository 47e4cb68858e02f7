//! String keywords: `maxLength`, `minLength`, `pattern` and `format`.
//!
//! Lengths count Unicode scalar values, not bytes. Patterns are unanchored,
//! as JSON Schema requires: `"a"` matches `"cat"`.

use regex::Regex;
use serde_json::{Map, Value};

use crate::compiler::{CompilationContext, KeywordResult, SchemaFactory};
use crate::error::{ErrorReporter, SchemaError};
use crate::format::FormatChecker;
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::{non_negative_integer, KeywordMeta, KeywordValidator};
use crate::validation::{EvalContext, EvaluationResults, Outcome};

/// Compiles a pattern, reporting failures at the keyword's location.
pub(crate) fn compile_regex(
    ctx: &CompilationContext,
    keyword: &str,
    pattern: &str,
) -> Result<Regex, SchemaError> {
    Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
        location: ctx.keyword_location(keyword),
        pattern: pattern.to_string(),
        source,
    })
}

#[derive(Debug, Clone, Copy)]
enum LengthBound {
    Max,
    Min,
}

struct LengthValidator {
    meta: KeywordMeta,
    limit: u64,
    bound: LengthBound,
}

impl KeywordValidator for LengthValidator {
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
        let Value::String(text) = instance else {
            return Outcome::Valid;
        };
        let len = text.chars().count() as u64;
        match self.bound {
            LengthBound::Max if len > self.limit => {
                let text = format!("length must be at most {}, got {}", self.limit, len);
                self.meta.report(ctx, location, text, reporter)
            }
            LengthBound::Min if len < self.limit => {
                let text = format!("length must be at least {}, got {}", self.limit, len);
                self.meta.report(ctx, location, text, reporter)
            }
            _ => Outcome::Valid,
        }
    }

    fn always_succeeds(&self) -> bool {
        matches!(self.bound, LengthBound::Min) && self.limit == 0
    }
}

pub(crate) fn compile_max_length(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(LengthValidator {
        meta: ctx.meta("maxLength"),
        limit: non_negative_integer(ctx, "maxLength", value)?,
        bound: LengthBound::Max,
    })))
}

pub(crate) fn compile_min_length(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    Ok(Some(Box::new(LengthValidator {
        meta: ctx.meta("minLength"),
        limit: non_negative_integer(ctx, "minLength", value)?,
        bound: LengthBound::Min,
    })))
}

struct PatternValidator {
    meta: KeywordMeta,
    regex: Regex,
}

impl KeywordValidator for PatternValidator {
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
            Value::String(text) if !self.regex.is_match(text) => {
                let text = format!("must match pattern '{}'", self.regex.as_str());
                self.meta.report(ctx, location, text, reporter)
            }
            _ => Outcome::Valid,
        }
    }
}

pub(crate) fn compile_pattern(
    _factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let Value::String(pattern) = value else {
        return Err(SchemaError::invalid_keyword(
            ctx.location(),
            "pattern",
            "a regular expression string",
        ));
    };
    Ok(Some(Box::new(PatternValidator {
        meta: ctx.meta("pattern"),
        regex: compile_regex(ctx, "pattern", pattern)?,
    })))
}

/// `format`, asserted only when a checker is configured for the name.
struct FormatValidator {
    meta: KeywordMeta,
    format: String,
    checker: Option<FormatChecker>,
}

impl KeywordValidator for FormatValidator {
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
        match (instance, &self.checker) {
            (Value::String(text), Some(checker)) if !checker(text) => {
                let text = format!("'{}' is not a valid {}", text, self.format);
                self.meta.report(ctx, location, text, reporter)
            }
            _ => Outcome::Valid,
        }
    }

    fn always_succeeds(&self) -> bool {
        self.checker.is_none()
    }
}

pub(crate) fn compile_format(
    factory: &mut SchemaFactory,
    ctx: &CompilationContext,
    _schema: &Map<String, Value>,
    value: &Value,
) -> KeywordResult {
    let Value::String(format) = value else {
        return Err(SchemaError::invalid_keyword(ctx.location(), "format", "a string"));
    };
    Ok(Some(Box::new(FormatValidator {
        meta: ctx.meta("format"),
        format: format.clone(),
        checker: factory.format_checker(format),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Draft;
    use crate::error::CollectingReporter;
    use crate::options::Options;
    use crate::schema::SchemaArena;
    use crate::uri::SchemaUri;
    use serde_json::json;

    fn context() -> CompilationContext {
        CompilationContext::document(SchemaUri::default_base(), Draft::Draft202012, false)
    }

    fn run(validator: &dyn KeywordValidator, instance: Value) -> CollectingReporter {
        let arena = SchemaArena::new();
        let ctx = EvalContext::new(&arena, 10);
        let mut reporter = CollectingReporter::new();
        validator.validate(
            &ctx,
            &instance,
            &JsonPointer::root(),
            &mut EvaluationResults::default(),
            &mut reporter,
            &mut Patch::new(),
        );
        reporter
    }

    #[test]
    fn test_length_counts_characters() {
        let mut factory = SchemaFactory::new(&Options::default());
        let schema = Map::new();
        let max = compile_max_length(&mut factory, &context(), &schema, &json!(3))
            .unwrap()
            .unwrap();
        assert!(run(max.as_ref(), json!("日本語")).is_empty());
        assert_eq!(run(max.as_ref(), json!("abcd")).error_count(), 1);
        assert!(run(max.as_ref(), json!(12345)).is_empty());
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let mut factory = SchemaFactory::new(&Options::default());
        let pattern = compile_pattern(&mut factory, &context(), &Map::new(), &json!("a+"))
            .unwrap()
            .unwrap();
        assert!(run(pattern.as_ref(), json!("xaax")).is_empty());
        let reporter = run(pattern.as_ref(), json!("xyz"));
        assert_eq!(reporter.messages()[0].message, "must match pattern 'a+'");
    }

    #[test]
    fn test_invalid_pattern_is_fatal() {
        let mut factory = SchemaFactory::new(&Options::default());
        let err = compile_pattern(&mut factory, &context(), &Map::new(), &json!("(unclosed"))
            .err()
            .unwrap();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_format_is_annotation_by_default() {
        let mut factory = SchemaFactory::new(&Options::default());
        let format = compile_format(&mut factory, &context(), &Map::new(), &json!("email"))
            .unwrap()
            .unwrap();
        assert!(format.always_succeeds());
        assert!(run(format.as_ref(), json!("not an email")).is_empty());

        let mut asserting = SchemaFactory::new(&Options::new().with_format_validation(true));
        let format = compile_format(&mut asserting, &context(), &Map::new(), &json!("email"))
            .unwrap()
            .unwrap();
        assert_eq!(run(format.as_ref(), json!("not an email")).error_count(), 1);
        assert!(run(format.as_ref(), json!("someone@example.com")).is_empty());
    }
}
