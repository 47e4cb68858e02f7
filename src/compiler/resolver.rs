//! External document resolution.
//!
//! References to documents outside the one being compiled are satisfied by a
//! [`SchemaResolver`]. The compiler asks for each distinct document at most
//! once per build; [`CachingResolver`] extends that across builds.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;
use url::Url;

/// Errors a resolver can report.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The resolver has no document for the URI.
    #[error("no schema document is available for '{0}'")]
    NotFound(String),

    /// Fetching the document failed.
    #[error("failed to fetch '{uri}': {message}")]
    Fetch {
        /// The requested URI.
        uri: String,
        /// Description of the failure.
        message: String,
    },
}

/// Supplies schema documents for absolute URIs.
///
/// Any `Fn(&Url) -> Result<Value, ResolveError>` closure is a resolver:
///
/// ```rust
/// use schemawalk::{ResolveError, SchemaBuilder};
/// use serde_json::json;
/// use url::Url;
///
/// let resolver = |uri: &Url| match uri.as_str() {
///     "http://example.com/positive.json" => Ok(json!({"minimum": 0})),
///     other => Err(ResolveError::NotFound(other.to_string())),
/// };
/// let schema = SchemaBuilder::new()
///     .resolver(resolver)
///     .build(&json!({"$ref": "http://example.com/positive.json"}))
///     .unwrap();
/// assert!(!schema.is_valid(&json!(-1)));
/// ```
pub trait SchemaResolver: Send + Sync {
    /// Returns the document at `uri` (which never carries a fragment).
    fn resolve(&self, uri: &Url) -> Result<Value, ResolveError>;
}

impl<F> SchemaResolver for F
where
    F: Fn(&Url) -> Result<Value, ResolveError> + Send + Sync,
{
    fn resolve(&self, uri: &Url) -> Result<Value, ResolveError> {
        self(uri)
    }
}

/// A resolver backed by an in-memory map of documents.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    documents: HashMap<String, Value>,
}

impl MapResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document under `uri`; a trailing empty fragment is ignored.
    pub fn with_document(mut self, uri: &str, document: Value) -> Self {
        self.documents.insert(uri.trim_end_matches('#').to_string(), document);
        self
    }

    /// Returns the number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl SchemaResolver for MapResolver {
    fn resolve(&self, uri: &Url) -> Result<Value, ResolveError> {
        self.documents
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(uri.to_string()))
    }
}

/// Memoizes successful lookups of an inner resolver.
///
/// The cache is shared by every build that uses this resolver, so a slow
/// inner resolver is asked for each document once overall.
pub struct CachingResolver<R> {
    inner: R,
    cache: RwLock<HashMap<String, Value>>,
}

impl<R: SchemaResolver> CachingResolver<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of cached documents.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }

    /// Drops every cached document.
    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

impl<R: SchemaResolver> SchemaResolver for CachingResolver<R> {
    fn resolve(&self, uri: &Url) -> Result<Value, ResolveError> {
        if let Some(document) = self.cache.read().get(uri.as_str()) {
            return Ok(document.clone());
        }
        let document = self.inner.resolve(uri)?;
        self.cache.write().insert(uri.to_string(), document.clone());
        Ok(document)
    }
}
