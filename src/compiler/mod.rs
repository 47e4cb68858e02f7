//! Schema compilation.
//!
//! This module turns schema JSON into a [`CompiledSchema`]. Compilation runs
//! in two phases: every reachable subschema is compiled into the arena and
//! registered under its URIs, then every `$ref`, `$dynamicRef` and
//! `$recursiveRef` is bound, fetching external documents through a
//! [`SchemaResolver`] when one is configured.

mod context;
mod dialect;
mod factory;
mod resolver;
mod store;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::SchemaError;
use crate::options::Options;
use crate::uri::SchemaUri;
use crate::validator::CompiledSchema;

pub(crate) use context::CompilationContext;
pub use dialect::Draft;
pub(crate) use dialect::KeywordResult;
pub(crate) use factory::SchemaFactory;
pub use resolver::{CachingResolver, MapResolver, ResolveError, SchemaResolver};

/// Configures and runs schema compilation.
///
/// # Example
///
/// ```rust
/// use schemawalk::{Draft, MapResolver, Options, SchemaBuilder};
/// use serde_json::json;
///
/// let resolver = MapResolver::new()
///     .with_document("http://example.com/name.json", json!({"type": "string"}));
///
/// let schema = SchemaBuilder::new()
///     .options(Options::new().with_default_schema_version(Draft::Draft7))
///     .resolver(resolver)
///     .build(&json!({
///         "properties": {"name": {"$ref": "http://example.com/name.json"}}
///     }))
///     .unwrap();
///
/// assert!(schema.is_valid(&json!({"name": "Alice"})));
/// assert!(!schema.is_valid(&json!({"name": 42})));
/// ```
#[derive(Clone, Default)]
pub struct SchemaBuilder {
    options: Options,
    resolver: Option<Arc<dyn SchemaResolver>>,
    base_uri: Option<SchemaUri>,
}

impl SchemaBuilder {
    /// Creates a builder with default options and no resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the options used for compilation and validation.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Sets the resolver for documents outside the one being compiled.
    ///
    /// Without a resolver, a reference to an unknown document fails the
    /// build (or stays unresolved under
    /// [`Options::with_lazy_references`]).
    pub fn resolver(mut self, resolver: impl SchemaResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets a resolver that other builders also hold, such as one
    /// [`CachingResolver`] shared by several builds.
    pub fn shared_resolver(mut self, resolver: Arc<dyn SchemaResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the URI the root document is identified by.
    ///
    /// Relative `$id` and `$ref` values in the root resolve against it. The
    /// default is `json-schema:///`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use schemawalk::{SchemaBuilder, SchemaUri};
    /// use serde_json::json;
    ///
    /// let base = SchemaUri::parse("http://example.com/root.json").unwrap();
    /// let schema = SchemaBuilder::new()
    ///     .base_uri(base)
    ///     .build(&json!({
    ///         "$ref": "http://example.com/root.json#/$defs/n",
    ///         "$defs": {"n": {"type": "number"}}
    ///     }))
    ///     .unwrap();
    /// assert!(schema.is_valid(&json!(1.5)));
    /// ```
    pub fn base_uri(mut self, uri: SchemaUri) -> Self {
        self.base_uri = Some(uri);
        self
    }

    /// Compiles `schema` and binds all of its references.
    ///
    /// The dialect comes from the root `$schema` when present, otherwise from
    /// [`Options::default_schema_version`].
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the schema is malformed, names an unknown
    /// dialect, declares the same identity twice, or references a target that
    /// cannot be found while lazy references are disabled.
    pub fn build(&self, schema: &Value) -> Result<CompiledSchema, SchemaError> {
        let base = self
            .base_uri
            .clone()
            .unwrap_or_else(SchemaUri::default_base);
        let mut factory = SchemaFactory::new(&self.options);
        let root =
            factory.compile_document(base, schema, self.options.default_schema_version)?;
        factory.resolve_references(self.resolver.as_deref())?;
        let arena = factory.finish();
        debug!(nodes = arena.len(), "schema compiled");
        Ok(CompiledSchema::new(arena, root, &self.options))
    }
}

/// Compiles `schema` with default options.
///
/// # Errors
///
/// See [`SchemaBuilder::build`].
///
/// # Example
///
/// ```rust
/// use serde_json::json;
///
/// let schema = schemawalk::build(&json!({"type": "integer", "minimum": 1})).unwrap();
/// assert!(schema.is_valid(&json!(3)));
/// assert!(!schema.is_valid(&json!(0)));
/// ```
pub fn build(schema: &Value) -> Result<CompiledSchema, SchemaError> {
    SchemaBuilder::new().build(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_dialect_is_rejected() {
        let err = build(&json!({"$schema": "http://example.com/my-dialect"}))
            .err()
            .unwrap();
        assert!(matches!(err, SchemaError::UnknownDialect(_)));
    }

    #[test]
    fn test_missing_reference_fails_without_lazy_mode() {
        let schema = json!({"$ref": "#/$defs/missing"});
        assert!(matches!(
            build(&schema),
            Err(SchemaError::UnresolvedReference(_))
        ));

        let lazy = SchemaBuilder::new()
            .options(Options::new().with_lazy_references(true))
            .build(&schema)
            .unwrap();
        assert!(!lazy.is_valid(&json!(1)));
    }

    #[test]
    fn test_resolver_failure_is_fatal() {
        let resolver = MapResolver::new();
        let err = SchemaBuilder::new()
            .resolver(resolver)
            .build(&json!({"$ref": "http://example.com/absent.json"}))
            .err()
            .unwrap();
        assert!(matches!(err, SchemaError::Resolve { .. }));
    }
}
