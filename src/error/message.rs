//! Validation message types.
//!
//! This module provides [`ValidationMessage`] for single keyword failures and
//! [`ValidationErrors`] for accumulating multiple messages.

use std::fmt::{self, Display};

use serde::Serialize;
use stillwater::prelude::*;

use crate::path::JsonPointer;
use crate::uri::SchemaUri;

/// A single keyword failure with full context.
///
/// `ValidationMessage` captures everything needed to locate a failure:
/// - **keyword**: The keyword that failed (`minimum`, `$ref`, `false`, ...)
/// - **schema_location**: Absolute URI of the failing keyword
/// - **evaluation_path**: The keyword path taken to reach it, through any `$ref`
/// - **instance_location**: Where in the instance the failure occurred
/// - **message**: Human-readable description of the failure
/// - **custom_message**: Override supplied by the schema's `errorMessage`
/// - **details**: Nested messages from combinator branches
///
/// # Example
///
/// ```rust
/// use schemawalk::{JsonPointer, SchemaUri, ValidationMessage};
///
/// let message = ValidationMessage::new(
///     "minimum",
///     SchemaUri::parse("http://example.com/s.json#/minimum").unwrap(),
///     JsonPointer::root().push_field("age"),
///     "-5 is less than minimum 0",
/// )
/// .with_custom_message(Some("age must not be negative".to_string()));
///
/// assert_eq!(message.keyword, "minimum");
/// assert_eq!(message.to_string(), "/age: age must not be negative");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMessage {
    /// The keyword that produced this message.
    pub keyword: String,
    /// Absolute URI of the failing keyword.
    pub schema_location: SchemaUri,
    /// Keyword path from the root schema, following references.
    pub evaluation_path: JsonPointer,
    /// Location of the failing value within the instance.
    pub instance_location: JsonPointer,
    /// Human-readable error message.
    pub message: String,
    /// Message supplied by `errorMessage`, when custom messages are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    /// Messages from nested branches (`anyOf`, `oneOf`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ValidationMessage>,
}

impl ValidationMessage {
    /// Creates a new message with an empty evaluation path.
    pub fn new(
        keyword: impl Into<String>,
        schema_location: SchemaUri,
        instance_location: JsonPointer,
        message: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            schema_location,
            evaluation_path: JsonPointer::root(),
            instance_location,
            message: message.into(),
            custom_message: None,
            details: Vec::new(),
        }
    }

    /// Sets the evaluation path and returns self for chaining.
    pub fn with_evaluation_path(mut self, path: JsonPointer) -> Self {
        self.evaluation_path = path;
        self
    }

    /// Sets the custom message and returns self for chaining.
    pub fn with_custom_message(mut self, message: Option<String>) -> Self {
        self.custom_message = message;
        self
    }

    /// Attaches nested branch messages and returns self for chaining.
    pub fn with_details(mut self, details: Vec<ValidationMessage>) -> Self {
        self.details = details;
        self
    }

    /// Returns the custom message if one was configured, else the default message.
    pub fn display_message(&self) -> &str {
        self.custom_message.as_deref().unwrap_or(&self.message)
    }
}

impl Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = if self.instance_location.is_root() {
            "(root)".to_string()
        } else {
            self.instance_location.to_string()
        };
        write!(f, "{}: {}", location, self.display_message())
    }
}

impl std::error::Error for ValidationMessage {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ValidationMessage>();
    assert_sync::<ValidationMessage>();
};

/// A non-empty collection of validation messages.
///
/// `ValidationErrors` wraps a `NonEmptyVec<ValidationMessage>` so that a
/// `Validation::Failure` always carries at least one message. It implements
/// `Semigroup`, so failures from independent validations combine:
///
/// ```rust
/// use schemawalk::{JsonPointer, SchemaUri, ValidationErrors, ValidationMessage};
/// use stillwater::prelude::*;
///
/// let location = SchemaUri::parse("http://example.com/s.json").unwrap();
/// let a = ValidationErrors::single(ValidationMessage::new(
///     "required", location.clone(), JsonPointer::root().push_field("name"), "missing",
/// ));
/// let b = ValidationErrors::single(ValidationMessage::new(
///     "format", location, JsonPointer::root().push_field("email"), "invalid",
/// ));
///
/// assert_eq!(a.combine(b).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(NonEmptyVec<ValidationMessage>);

impl ValidationErrors {
    /// Creates a collection containing a single message.
    pub fn single(message: ValidationMessage) -> Self {
        Self(NonEmptyVec::singleton(message))
    }

    /// Creates a collection from a `Vec`, or `None` if it is empty.
    pub fn try_from_vec(messages: Vec<ValidationMessage>) -> Option<Self> {
        NonEmptyVec::from_vec(messages).map(Self)
    }

    /// Returns the number of messages in this collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is non-empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the contained messages.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.0.iter()
    }

    /// Returns all messages at the specified instance location.
    pub fn at_location(&self, location: &JsonPointer) -> Vec<&ValidationMessage> {
        self.0
            .iter()
            .filter(|m| &m.instance_location == location)
            .collect()
    }

    /// Returns all messages produced by the specified keyword.
    pub fn with_keyword(&self, keyword: &str) -> Vec<&ValidationMessage> {
        self.0.iter().filter(|m| m.keyword == keyword).collect()
    }

    /// Returns the first message in the collection.
    pub fn first(&self) -> &ValidationMessage {
        self.0.head()
    }

    /// Converts this collection into a `Vec<ValidationMessage>`.
    pub fn into_vec(self) -> Vec<ValidationMessage> {
        self.0.into_vec()
    }
}

impl Semigroup for ValidationErrors {
    fn combine(self, other: Self) -> Self {
        ValidationErrors(self.0.combine(other.0))
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.len())?;
        for (i, message) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationMessage;
    type IntoIter = std::vec::IntoIter<ValidationMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ValidationErrors>();
    assert_sync::<ValidationErrors>();
};

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> SchemaUri {
        SchemaUri::parse("http://example.com/schema.json#/properties/a").unwrap()
    }

    fn message(keyword: &str, at: JsonPointer, text: &str) -> ValidationMessage {
        ValidationMessage::new(keyword, location(), at, text)
    }

    #[test]
    fn test_message_creation() {
        let msg = message("type", JsonPointer::root().push_field("a"), "Expected string");
        assert_eq!(msg.keyword, "type");
        assert_eq!(msg.message, "Expected string");
        assert!(msg.custom_message.is_none());
        assert!(msg.details.is_empty());
        assert!(msg.evaluation_path.is_root());
    }

    #[test]
    fn test_display_prefers_custom_message() {
        let msg = message("type", JsonPointer::root(), "Expected string")
            .with_custom_message(Some("must be text".to_string()));
        assert_eq!(msg.to_string(), "(root): must be text");
    }

    #[test]
    fn test_serializes_locations_as_strings() {
        let msg = message("minimum", JsonPointer::root().push_index(2), "too small")
            .with_evaluation_path(JsonPointer::root().push_field("minimum"));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["instanceLocation"], "/2");
        assert_eq!(json["evaluationPath"], "/minimum");
        assert_eq!(
            json["schemaLocation"],
            "http://example.com/schema.json#/properties/a"
        );
        assert!(json.get("customMessage").is_none());
    }

    #[test]
    fn test_errors_try_from_vec() {
        assert!(ValidationErrors::try_from_vec(Vec::new()).is_none());
        let errors = ValidationErrors::try_from_vec(vec![message(
            "type",
            JsonPointer::root(),
            "x",
        )])
        .unwrap();
        assert_eq!(errors.len(), 1);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_errors_filters() {
        let a = JsonPointer::root().push_field("a");
        let b = JsonPointer::root().push_field("b");
        let errors = ValidationErrors::single(message("type", a.clone(), "1"))
            .combine(ValidationErrors::single(message("minimum", a.clone(), "2")))
            .combine(ValidationErrors::single(message("type", b.clone(), "3")));

        assert_eq!(errors.at_location(&a).len(), 2);
        assert_eq!(errors.at_location(&b).len(), 1);
        assert_eq!(errors.with_keyword("type").len(), 2);
        assert_eq!(errors.first().message, "1");
    }

    #[test]
    fn test_errors_display() {
        let errors = ValidationErrors::single(message(
            "required",
            JsonPointer::root().push_field("name"),
            "Required property 'name' not found",
        ));
        let display = errors.to_string();
        assert!(display.contains("1 error(s)"));
        assert!(display.contains("/name: Required property 'name' not found"));
    }

    #[test]
    fn test_semigroup_associativity() {
        let e1 = ValidationErrors::single(message("a", JsonPointer::root(), "1"));
        let e2 = ValidationErrors::single(message("b", JsonPointer::root(), "2"));
        let e3 = ValidationErrors::single(message("c", JsonPointer::root(), "3"));

        let left = e1.clone().combine(e2.clone()).combine(e3.clone());
        let right = e1.combine(e2.combine(e3));

        let left_msgs: Vec<_> = left.iter().map(|m| &m.message).collect();
        let right_msgs: Vec<_> = right.iter().map(|m| &m.message).collect();
        assert_eq!(left_msgs, right_msgs);
    }
}
