//! Error reporters receive validation messages as they are produced.

use crate::error::ValidationMessage;
use crate::validation::WalkResult;

/// Receives each [`ValidationMessage`] as validation produces it.
///
/// Returning [`WalkResult::Abort`] asks the validator to stop; every keyword
/// propagates the abort upward without evaluating its remaining siblings.
///
/// Closures implement this trait, so ad-hoc reporters are easy to write:
///
/// ```rust
/// use schemawalk::{ValidationMessage, WalkResult};
/// use serde_json::json;
///
/// let schema = schemawalk::build(&json!({"type": "string"})).unwrap();
/// let mut seen = Vec::new();
/// let mut reporter = |message: ValidationMessage| {
///     seen.push(message.keyword.clone());
///     WalkResult::Advance
/// };
/// schema.validate_with_reporter(&json!(1), &schemawalk::JsonPointer::root(), &mut reporter);
/// assert_eq!(seen, vec!["type"]);
/// ```
pub trait ErrorReporter {
    /// Records a message; the return value says whether validation continues.
    fn error(&mut self, message: ValidationMessage) -> WalkResult;
}

impl<F> ErrorReporter for F
where
    F: FnMut(ValidationMessage) -> WalkResult,
{
    fn error(&mut self, message: ValidationMessage) -> WalkResult {
        self(message)
    }
}

/// A reporter that stores messages, optionally aborting after a maximum count.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    messages: Vec<ValidationMessage>,
    max_errors: Option<usize>,
}

impl CollectingReporter {
    /// Creates a reporter that collects every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reporter that requests abort once `max` messages are stored.
    pub fn with_max_errors(max: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_errors: Some(max),
        }
    }

    /// Returns the collected messages.
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Returns the number of collected messages.
    pub fn error_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no messages were collected.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consumes the reporter, returning the collected messages.
    pub fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages
    }
}

impl ErrorReporter for CollectingReporter {
    fn error(&mut self, message: ValidationMessage) -> WalkResult {
        self.messages.push(message);
        match self.max_errors {
            Some(max) if self.messages.len() >= max => WalkResult::Abort,
            _ => WalkResult::Advance,
        }
    }
}
