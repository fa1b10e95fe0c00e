//! Error types for template parsing, formatting and loading.

use std::fmt;

use thiserror::Error;

use crate::parser::PlaceholderName;

/// Errors raised while tokenizing a single template field.
///
/// Offsets are byte offsets into the field text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unterminated placeholder starting at offset {offset}")]
    UnterminatedPlaceholder { offset: usize },

    #[error("Malformed syntax at offset {offset}: {reason}")]
    MalformedSyntax { offset: usize, reason: &'static str },

    #[error("Unknown placeholder '{name}' at offset {offset}")]
    UnknownPlaceholder { name: String, offset: usize },
}

/// Errors raised when a format directive cannot be applied to a placeholder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Format '{format}' cannot be applied to {{{placeholder}}}")]
    IncompatibleFormat {
        placeholder: PlaceholderName,
        format: String,
    },

    #[error("Invalid format specification '{format}' for {{{placeholder}}}: {reason}")]
    InvalidFormatSpec {
        placeholder: PlaceholderName,
        format: String,
        reason: &'static str,
    },
}

/// Location of a field inside a [`MessageTemplate`](crate::MessageTemplate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocation {
    Key,
    Value,
    HeaderKey(usize),
    HeaderValue(usize),
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLocation::Key => write!(f, "key"),
            FieldLocation::Value => write!(f, "value"),
            FieldLocation::HeaderKey(i) => write!(f, "headers[{i}].key"),
            FieldLocation::HeaderValue(i) => write!(f, "headers[{i}].value"),
        }
    }
}

/// Template-level error, tagged with the field it came from.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to parse {field}: {source}")]
    Parse {
        field: FieldLocation,
        #[source]
        source: ParseError,
    },

    #[error("Invalid format in {field}: {source}")]
    Format {
        field: FieldLocation,
        #[source]
        source: FormatError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template file error: {0}")]
    Load(String),
}

impl TemplateError {
    /// The field the error was raised for, if it is field-specific.
    pub fn field(&self) -> Option<FieldLocation> {
        match self {
            TemplateError::Parse { field, .. } | TemplateError::Format { field, .. } => {
                Some(*field)
            }
            TemplateError::Io(_) | TemplateError::Load(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_location_display() {
        assert_eq!(FieldLocation::Key.to_string(), "key");
        assert_eq!(FieldLocation::Value.to_string(), "value");
        assert_eq!(FieldLocation::HeaderKey(2).to_string(), "headers[2].key");
        assert_eq!(FieldLocation::HeaderValue(0).to_string(), "headers[0].value");
    }

    #[test]
    fn test_format_error_message_wraps_placeholder_in_braces() {
        let err = FormatError::IncompatibleFormat {
            placeholder: PlaceholderName::Uuid,
            format: "04d".to_string(),
        };
        assert_eq!(err.to_string(), "Format '04d' cannot be applied to {uuid}");
    }

    #[test]
    fn test_template_error_field() {
        let err = TemplateError::Parse {
            field: FieldLocation::HeaderValue(1),
            source: ParseError::UnterminatedPlaceholder { offset: 3 },
        };
        assert_eq!(err.field(), Some(FieldLocation::HeaderValue(1)));
        assert_eq!(
            err.to_string(),
            "Failed to parse headers[1].value: Unterminated placeholder starting at offset 3"
        );
        assert_eq!(TemplateError::Load("x".into()).field(), None);
    }
}
