//! # Schemawalk
//!
//! A JSON Schema compiler and validator for draft-04, draft-07, 2019-09 and
//! 2020-12, built around a walkable tree of compiled keywords.
//!
//! ## Overview
//!
//! A schema document is compiled once into a [`CompiledSchema`]: an arena of
//! nodes, each holding one validator per keyword. References are bound after
//! compilation, so cyclic and forward references need no special handling,
//! and `$dynamicRef`/`$recursiveRef` re-target at validation time through the
//! dynamic scope.
//!
//! Validation reports every failure to an [`ErrorReporter`], which can stop
//! the run early. Keywords that apply subschemas to the same instance record
//! which properties and items they evaluated, so `unevaluatedProperties` and
//! `unevaluatedItems` see exactly what their siblings covered. Absent
//! properties with a `default` come back as a [`Patch`].
//!
//! ## Core Types
//!
//! - [`SchemaBuilder`]: compiles a schema with [`Options`] and a [`SchemaResolver`]
//! - [`CompiledSchema`]: validates, walks and applies defaults
//! - [`ValidationMessage`]: one failure with its keyword, schema location,
//!   evaluation path and instance location
//! - [`SchemaError`]: a schema that cannot be compiled
//! - [`SchemaVisitor`]: observes a walk keyword by keyword
//!
//! ## Example
//!
//! ```rust
//! use schemawalk::JsonPointer;
//! use serde_json::json;
//!
//! let schema = schemawalk::build(&json!({
//!     "$schema": "https://json-schema.org/draft/2020-12/schema",
//!     "type": "object",
//!     "properties": {"id": {"type": "integer"}},
//!     "unevaluatedProperties": false
//! }))
//! .unwrap();
//!
//! assert!(schema.validate(&json!({"id": 1})).is_success());
//!
//! let report = schema.validate_report(&json!({"id": 1, "extra": true}), &JsonPointer::root());
//! assert_eq!(report.errors.len(), 1);
//! assert_eq!(report.errors[0].keyword, "unevaluatedProperties");
//! assert_eq!(report.errors[0].instance_location.to_string(), "/extra");
//! ```

pub mod compiler;
pub mod error;
pub mod format;
pub mod options;
pub mod patch;
pub mod path;
pub mod schema;
pub mod uri;
pub mod validation;
pub mod validator;
pub mod walk;

pub use compiler::{
    build, CachingResolver, Draft, MapResolver, ResolveError, SchemaBuilder, SchemaResolver,
};
pub use error::{
    CollectingReporter, ErrorReporter, SchemaError, ValidationErrors, ValidationMessage,
};
pub use format::FormatChecker;
pub use options::Options;
pub use patch::{Patch, PatchOperation};
pub use path::{JsonPointer, PathSegment};
pub use uri::SchemaUri;
pub use validation::{EvalContext, EvalFlags, EvaluationResults, Outcome, WalkResult};
pub use validator::{CompiledSchema, ValidationReport};
pub use walk::{DefaultsCollector, SchemaVisitor, WalkEvent};

/// Type alias for validation results using ValidationErrors
pub type ValidationResult<T> = stillwater::Validation<T, ValidationErrors>;
