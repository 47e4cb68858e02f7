//! The keyword validator interface.
//!
//! This module provides the [`KeywordValidator`] trait that every compiled
//! keyword implements, so an object node can hold a homogeneous list of
//! keywords and run them without branching on their concrete kind.

use serde_json::Value;

use crate::error::{ErrorReporter, ValidationMessage};
use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::uri::SchemaUri;
use crate::validation::{EvalContext, EvaluationResults, Outcome, WalkResult};
use crate::walk::{SchemaVisitor, WalkEvent};

/// Identity shared by every keyword validator: its name, location and
/// optional custom message.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMeta {
    keyword: &'static str,
    schema_location: SchemaUri,
    custom_message: Option<String>,
}

impl KeywordMeta {
    pub(crate) fn new(
        keyword: &'static str,
        schema_location: SchemaUri,
        custom_message: Option<String>,
    ) -> Self {
        Self {
            keyword,
            schema_location,
            custom_message,
        }
    }

    /// The keyword name.
    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// Absolute URI of the keyword.
    pub fn schema_location(&self) -> &SchemaUri {
        &self.schema_location
    }

    /// The `errorMessage` override in effect for this keyword.
    pub fn custom_message(&self) -> Option<&str> {
        self.custom_message.as_deref()
    }

    /// Builds a message for a failure at `location`.
    pub(crate) fn message(
        &self,
        ctx: &EvalContext<'_>,
        location: &JsonPointer,
        text: impl Into<String>,
    ) -> ValidationMessage {
        ValidationMessage::new(
            self.keyword,
            self.schema_location.clone(),
            location.clone(),
            text,
        )
        .with_evaluation_path(ctx.eval_path().push_field(self.keyword))
        .with_custom_message(self.custom_message.clone())
    }

    /// Reports a failure at `location` and maps the reporter's answer to an outcome.
    pub(crate) fn report(
        &self,
        ctx: &EvalContext<'_>,
        location: &JsonPointer,
        text: impl Into<String>,
        reporter: &mut dyn ErrorReporter,
    ) -> Outcome {
        Outcome::reported(reporter.error(self.message(ctx, location, text)))
    }

    /// Describes this keyword being applied to `instance`.
    pub(crate) fn event<'a>(
        &'a self,
        ctx: &EvalContext<'_>,
        instance: &'a Value,
        location: &'a JsonPointer,
    ) -> WalkEvent<'a> {
        WalkEvent {
            keyword: self.keyword,
            schema_location: &self.schema_location,
            evaluation_path: ctx.eval_path().push_field(self.keyword),
            instance_location: location.clone(),
            instance: Some(instance),
            default_value: None,
        }
    }
}

/// A compiled keyword.
///
/// Implementations are immutable after compilation and shared across
/// threads, hence the `Send + Sync` bounds.
pub trait KeywordValidator: Send + Sync {
    /// The keyword's identity.
    fn meta(&self) -> &KeywordMeta;

    /// Validates `instance`, recording claimed members into `results` when
    /// the context asks for them and default insertions into `patch`.
    fn validate(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        results: &mut EvaluationResults,
        reporter: &mut dyn ErrorReporter,
        patch: &mut Patch,
    ) -> Outcome;

    /// Reports this keyword to `visitor`. Applicators also walk their children.
    fn walk(
        &self,
        ctx: &EvalContext<'_>,
        instance: &Value,
        location: &JsonPointer,
        visitor: &mut dyn SchemaVisitor,
    ) -> WalkResult {
        visitor.visit(&self.meta().event(ctx, instance, location))
    }

    /// True if this keyword accepts every instance.
    fn always_succeeds(&self) -> bool {
        false
    }

    /// True if this keyword rejects every instance.
    fn always_fails(&self) -> bool {
        false
    }
}

