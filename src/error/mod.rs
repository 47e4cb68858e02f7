//! Error types for compilation and validation.
//!
//! Compilation failures are fatal [`SchemaError`]s. Validation failures are
//! collected as [`ValidationMessage`]s and delivered to an [`ErrorReporter`].

mod message;
mod reporter;
mod schema_error;

pub use message::{ValidationErrors, ValidationMessage};
pub use reporter::{CollectingReporter, ErrorReporter};
pub use schema_error::SchemaError;
