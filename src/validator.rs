//! The compiled schema and its entry points.
//!
//! A [`CompiledSchema`] owns the arena produced by compilation. It is
//! immutable, so one instance can validate from many threads at once.

use rayon::prelude::*;
use serde_json::Value;
use stillwater::Validation;
use tracing::trace;

use crate::error::{CollectingReporter, ErrorReporter, ValidationErrors, ValidationMessage};
use crate::options::Options;
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::schema::{NodeId, SchemaArena, SchemaNode};
use crate::validation::{EvalContext, EvaluationResults, Outcome, WalkResult};
use crate::walk::{DefaultsCollector, SchemaVisitor};
use crate::ValidationResult;

/// Everything one validation run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Messages in the order they were reported.
    pub errors: Vec<ValidationMessage>,
    /// Defaults for properties the instance omits.
    pub patch: Patch,
}

impl ValidationReport {
    /// Returns true if no message was reported.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A schema compiled and ready to validate instances.
///
/// # Thread Safety
///
/// `CompiledSchema` is `Send + Sync`; validation only reads the arena.
///
/// # Example
///
/// ```rust
/// use schemawalk::JsonPointer;
/// use serde_json::json;
/// use stillwater::Validation;
///
/// let schema = schemawalk::build(&json!({
///     "type": "object",
///     "properties": {
///         "name": {"type": "string"},
///         "role": {"default": "user"}
///     },
///     "required": ["name"]
/// }))
/// .unwrap();
///
/// match schema.validate(&json!({"name": "Alice"})) {
///     Validation::Success(patched) => {
///         assert_eq!(patched, json!({"name": "Alice", "role": "user"}));
///     }
///     Validation::Failure(_) => panic!("expected success"),
/// }
///
/// let report = schema.validate_report(&json!({}), &JsonPointer::root());
/// assert_eq!(report.errors[0].message, "required property 'name' is missing");
/// ```
pub struct CompiledSchema {
    arena: SchemaArena,
    root: NodeId,
    max_depth: usize,
    max_errors: Option<usize>,
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CompiledSchema>();
};

impl CompiledSchema {
    pub(crate) fn new(arena: SchemaArena, root: NodeId, options: &Options) -> Self {
        Self {
            arena,
            root,
            max_depth: options.max_depth,
            max_errors: options.max_errors,
        }
    }

    /// Returns the root node.
    pub fn root(&self) -> &SchemaNode {
        self.arena.node(self.root)
    }

    /// Returns the compiled arena.
    pub fn arena(&self) -> &SchemaArena {
        &self.arena
    }

    /// Validates `instance`, returning it with defaults applied on success.
    ///
    /// On failure every reported message is returned, up to
    /// [`Options::max_errors`] when that is set.
    pub fn validate(&self, instance: &Value) -> ValidationResult<Value> {
        let report = self.validate_report(instance, &JsonPointer::root());
        match ValidationErrors::try_from_vec(report.errors) {
            Some(errors) => Validation::Failure(errors),
            None => Validation::Success(report.patch.apply(instance)),
        }
    }

    /// Validates `instance`, found at `location` in some larger document.
    ///
    /// Message locations and patch paths are prefixed with `location`.
    pub fn validate_report(&self, instance: &Value, location: &JsonPointer) -> ValidationReport {
        let mut reporter = match self.max_errors {
            Some(max) => CollectingReporter::with_max_errors(max),
            None => CollectingReporter::new(),
        };
        let patch = self.validate_with_reporter(instance, location, &mut reporter);
        ValidationReport {
            errors: reporter.into_messages(),
            patch,
        }
    }

    /// Validates `instance`, sending each message to `reporter`.
    ///
    /// Validation stops as soon as the reporter returns
    /// [`WalkResult::Abort`]. The returned patch holds the defaults gathered
    /// up to that point.
    pub fn validate_with_reporter(
        &self,
        instance: &Value,
        location: &JsonPointer,
        reporter: &mut dyn ErrorReporter,
    ) -> Patch {
        self.run(instance, location, reporter).1
    }

    /// Returns true if `instance` is valid, stopping at the first error.
    pub fn is_valid(&self, instance: &Value) -> bool {
        let mut first_error = |_: ValidationMessage| WalkResult::Abort;
        let (outcome, _) = self.run(instance, &JsonPointer::root(), &mut first_error);
        outcome.is_valid()
    }

    /// Walks `instance` through the schema, sending every applicable keyword
    /// to `visitor`.
    ///
    /// A walk enforces nothing: it visits every `allOf` branch, the `anyOf`
    /// and `oneOf` branches the instance matches, and the `if` branch that
    /// applies.
    pub fn walk(
        &self,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        EvalContext::new(&self.arena, self.max_depth).walk_node(
            self.root,
            instance,
            location,
            visitor,
        )
    }

    /// Returns `instance` with every applicable default inserted.
    ///
    /// Defaults are gathered by a walk, so an instance that fails validation
    /// still receives them.
    pub fn apply_defaults(&self, instance: &Value) -> Value {
        let mut collector = DefaultsCollector::new();
        self.walk(instance, &JsonPointer::root(), &mut collector);
        collector.into_patch().apply(instance)
    }

    /// Validates many instances in parallel.
    ///
    /// Results are returned in input order.
    pub fn validate_many(&self, instances: &[Value]) -> Vec<ValidationResult<Value>> {
        instances
            .par_iter()
            .map(|instance| self.validate(instance))
            .collect()
    }

    fn run(
        &self,
        instance: &Value,
        location: &JsonPointer,
        reporter: &mut dyn ErrorReporter,
    ) -> (Outcome, Patch) {
        let ctx = EvalContext::new(&self.arena, self.max_depth);
        let mut patch = Patch::new();
        let outcome = ctx.evaluate(
            self.root,
            instance,
            location,
            &mut EvaluationResults::default(),
            reporter,
            &mut patch,
        );
        trace!(?outcome, location = %location, "validated instance");
        (outcome, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::SchemaBuilder;
    use serde_json::json;

    #[test]
    fn test_is_valid_stops_at_first_error() {
        let schema = crate::build(&json!({"minimum": 10, "multipleOf": 3})).unwrap();
        assert!(schema.is_valid(&json!(12)));
        assert!(!schema.is_valid(&json!(4)));
    }

    #[test]
    fn test_max_errors_truncates_report() {
        let schema = SchemaBuilder::new()
            .options(Options::new().with_max_errors(1))
            .build(&json!({"minimum": 10, "multipleOf": 3}))
            .unwrap();
        let report = schema.validate_report(&json!(4), &JsonPointer::root());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].keyword, "minimum");
    }

    #[test]
    fn test_report_locations_are_prefixed() {
        let schema = crate::build(&json!({"properties": {"a": {"type": "string"}}})).unwrap();
        let base = JsonPointer::root().push_field("payload");
        let report = schema.validate_report(&json!({"a": 1}), &base);
        assert_eq!(report.errors[0].instance_location.to_string(), "/payload/a");
    }

    #[test]
    fn test_apply_defaults_ignores_validity() {
        let schema = crate::build(&json!({
            "properties": {"n": {"type": "integer"}, "flag": {"default": false}}
        }))
        .unwrap();
        let instance = json!({"n": "not a number"});
        assert!(!schema.is_valid(&instance));
        assert_eq!(
            schema.apply_defaults(&instance),
            json!({"n": "not a number", "flag": false})
        );
    }

    #[test]
    fn test_validate_many_preserves_order() {
        let schema = crate::build(&json!({"type": "string"})).unwrap();
        let results = schema.validate_many(&[json!("a"), json!(1), json!("b")]);
        assert!(results[0].is_success());
        assert!(results[1].is_failure());
        assert!(results[2].is_success());
    }
}
