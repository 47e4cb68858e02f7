//! Fatal schema compilation errors.

use crate::compiler::ResolveError;
use crate::uri::SchemaUri;

/// Errors that abort schema compilation.
///
/// Unlike [`ValidationMessage`](crate::ValidationMessage), which describes an
/// instance that does not satisfy a schema, a `SchemaError` means the schema
/// itself cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A schema position holds something other than an object or a boolean.
    #[error("{location}: a schema must be an object or a boolean")]
    InvalidSchema {
        /// Location of the offending value.
        location: SchemaUri,
    },

    /// A keyword operand has the wrong JSON type or range.
    #[error("{location}: keyword '{keyword}' expects {expected}")]
    InvalidKeyword {
        /// Location of the keyword.
        location: SchemaUri,
        /// The keyword name.
        keyword: String,
        /// Description of the accepted operand.
        expected: &'static str,
    },

    /// Two different schemas claim the same identity.
    #[error("schema identity '{0}' is already registered")]
    DuplicateIdentity(SchemaUri),

    /// A reference target could not be found anywhere.
    #[error("unresolved reference '{0}'")]
    UnresolvedReference(SchemaUri),

    /// A `pattern` or `patternProperties` key is not a valid regular expression.
    #[error("{location}: invalid regular expression '{pattern}': {source}")]
    InvalidPattern {
        /// Location of the keyword.
        location: SchemaUri,
        /// The rejected pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// `$schema` names a dialect this crate does not implement.
    #[error("unsupported schema dialect '{0}'")]
    UnknownDialect(String),

    /// `$id`, `$ref` or a base URI could not be parsed.
    #[error("invalid URI '{uri}': {source}")]
    InvalidUri {
        /// The raw URI text.
        uri: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The resolver failed to supply an external document.
    #[error("failed to resolve '{uri}': {source}")]
    Resolve {
        /// The document URI that was requested.
        uri: SchemaUri,
        /// The resolver's error.
        #[source]
        source: ResolveError,
    },
}

impl SchemaError {
    pub(crate) fn invalid_keyword(
        location: &SchemaUri,
        keyword: &str,
        expected: &'static str,
    ) -> Self {
        SchemaError::InvalidKeyword {
            location: location.append_keyword(keyword),
            keyword: keyword.to_string(),
            expected,
        }
    }
}
