//! Error types for batch dispatch.

use message_template::TemplateError;
use thiserror::Error;

/// Errors that abort a batch before anything is sent.
///
/// Per-iteration transport failures are not errors at this level; they are
/// recorded in the [`BatchResult`](crate::BatchResult).
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid dispatch request: {0}")]
    Validation(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}
