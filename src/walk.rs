//! Walking an instance through a compiled schema.
//!
//! A walk visits every keyword that applies to an instance without enforcing
//! pass/fail. Visitors observe one [`WalkEvent`] per keyword and may stop
//! the walk early.
//!
//! # Example
//!
//! ```rust
//! use schemawalk::{DefaultsCollector, JsonPointer, WalkResult};
//! use serde_json::json;
//!
//! let schema = schemawalk::build(&json!({
//!     "properties": {"role": {"default": "user"}}
//! }))
//! .unwrap();
//!
//! let mut collector = DefaultsCollector::new();
//! assert_eq!(
//!     schema.walk(&json!({}), &JsonPointer::root(), &mut collector),
//!     WalkResult::Advance
//! );
//! assert_eq!(collector.into_patch().apply(&json!({})), json!({"role": "user"}));
//! ```

use serde_json::Value;

use crate::patch::Patch;
use crate::path::JsonPointer;
use crate::uri::SchemaUri;
use crate::validation::WalkResult;

/// One keyword applied to one instance location.
#[derive(Debug, Clone)]
pub struct WalkEvent<'a> {
    /// The keyword name; `default` for a default-value insertion.
    pub keyword: &'static str,
    /// Absolute URI of the keyword.
    pub schema_location: &'a SchemaUri,
    /// Keyword path from the root schema.
    pub evaluation_path: JsonPointer,
    /// Where in the instance the keyword applies.
    pub instance_location: JsonPointer,
    /// The instance value, absent for default insertions.
    pub instance: Option<&'a Value>,
    /// The default value to insert at `instance_location`.
    pub default_value: Option<&'a Value>,
}

/// Receives walk events.
///
/// Closures taking `&WalkEvent` implement this trait.
pub trait SchemaVisitor {
    /// Observes one event; returning [`WalkResult::Abort`] stops the walk.
    fn visit(&mut self, event: &WalkEvent<'_>) -> WalkResult;
}

impl<F> SchemaVisitor for F
where
    F: FnMut(&WalkEvent<'_>) -> WalkResult,
{
    fn visit(&mut self, event: &WalkEvent<'_>) -> WalkResult {
        self(event)
    }
}

/// A visitor that turns `default` events into a [`Patch`].
#[derive(Debug, Default)]
pub struct DefaultsCollector {
    patch: Patch,
}

impl DefaultsCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected patch.
    pub fn into_patch(self) -> Patch {
        self.patch
    }
}

impl SchemaVisitor for DefaultsCollector {
    fn visit(&mut self, event: &WalkEvent<'_>) -> WalkResult {
        if let (None, Some(value)) = (event.instance, event.default_value) {
            self.patch.add(event.instance_location.clone(), value.clone());
        }
        WalkResult::Advance
    }
}
