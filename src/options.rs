//! Compiler and validator configuration.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::compiler::Draft;
use crate::format::FormatChecker;

/// Flat configuration for building and running a compiled schema.
///
/// Options can be built fluently or deserialized from JSON (camelCase keys,
/// every field optional). Format checkers can only be registered through
/// the builder.
///
/// # Example
///
/// ```rust
/// use schemawalk::{Draft, Options};
///
/// let options = Options::new()
///     .with_format_validation(true)
///     .with_default_schema_version(Draft::Draft7)
///     .with_max_errors(10);
///
/// let from_json: Options = serde_json::from_value(serde_json::json!({
///     "requireFormatValidation": true,
///     "defaultSchemaVersion": "draft7",
///     "maxErrors": 10
/// })).unwrap();
///
/// assert_eq!(options.max_errors, from_json.max_errors);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Treat `format` as an assertion rather than an annotation.
    pub require_format_validation: bool,
    /// Honour `errorMessage` overrides in schemas.
    pub enable_custom_error_message: bool,
    /// Dialect used when a document has no `$schema`.
    pub default_schema_version: Draft,
    /// Maximum number of references followed in one validation chain.
    pub max_depth: usize,
    /// Stop validating after this many messages.
    pub max_errors: Option<usize>,
    /// Leave unresolvable references to be reported at validation time.
    pub lazy_references: bool,
    #[serde(skip)]
    format_checkers: IndexMap<String, FormatChecker>,
}

impl Options {
    /// Creates options with defaults: 2020-12, format as annotation, max depth 100.
    pub fn new() -> Self {
        Self {
            require_format_validation: false,
            enable_custom_error_message: false,
            default_schema_version: Draft::default(),
            max_depth: 100,
            max_errors: None,
            lazy_references: false,
            format_checkers: IndexMap::new(),
        }
    }

    /// Sets whether `format` is asserted.
    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.require_format_validation = enabled;
        self
    }

    /// Sets whether `errorMessage` overrides are honoured.
    pub fn with_custom_error_messages(mut self, enabled: bool) -> Self {
        self.enable_custom_error_message = enabled;
        self
    }

    /// Sets the dialect used for documents without `$schema`.
    pub fn with_default_schema_version(mut self, draft: Draft) -> Self {
        self.default_schema_version = draft;
        self
    }

    /// Sets the maximum reference depth.
    ///
    /// When a reference chain exceeds this depth, validation reports a
    /// `max_depth_exceeded` message instead of recursing further.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Stops validation once `max` messages have been reported.
    pub fn with_max_errors(mut self, max: usize) -> Self {
        self.max_errors = Some(max);
        self
    }

    /// Defers unresolved references to validation time.
    pub fn with_lazy_references(mut self, enabled: bool) -> Self {
        self.lazy_references = enabled;
        self
    }

    /// Registers a checker for a `format` name, replacing any built-in one.
    ///
    /// ```rust
    /// use schemawalk::Options;
    ///
    /// let options = Options::new()
    ///     .with_format_validation(true)
    ///     .with_format_checker("even-length", |s: &str| s.len() % 2 == 0);
    /// ```
    pub fn with_format_checker<F>(mut self, name: impl Into<String>, checker: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.format_checkers.insert(name.into(), Arc::new(checker));
        self
    }

    pub(crate) fn format_checkers(&self) -> &IndexMap<String, FormatChecker> {
        &self.format_checkers
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("require_format_validation", &self.require_format_validation)
            .field(
                "enable_custom_error_message",
                &self.enable_custom_error_message,
            )
            .field("default_schema_version", &self.default_schema_version)
            .field("max_depth", &self.max_depth)
            .field("max_errors", &self.max_errors)
            .field("lazy_references", &self.lazy_references)
            .field(
                "format_checkers",
                &self.format_checkers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
