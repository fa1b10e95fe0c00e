//! Format directives for placeholders.
//!
//! - no format: canonical rendering (hyphenated lowercase UUID, plain decimal
//!   count, ISO-8601 UTC timestamp with second precision)
//! - `[width]d`: zero-padded decimal, `{count}` only
//! - anything else: date pattern, `{timestamp}` only

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::FormatError;
use crate::parser::{PlaceholderName, PlaceholderToken};

/// Widest zero-padding accepted by `{count:Nd}`.
pub const MAX_PAD_WIDTH: usize = 64;

/// Concrete source value for one placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderValue {
    Uuid(Uuid),
    Count(u64),
    Timestamp(DateTime<Utc>),
}

impl PlaceholderValue {
    fn render_default(&self) -> String {
        match self {
            PlaceholderValue::Uuid(id) => id.hyphenated().to_string(),
            PlaceholderValue::Count(n) => n.to_string(),
            PlaceholderValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// A classified format directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatDirective {
    Default,
    ZeroPad { width: usize },
    Date(DatePattern),
}

impl FormatDirective {
    /// Classify the token's format against its placeholder.
    pub fn for_token(token: &PlaceholderToken) -> Result<Self, FormatError> {
        let Some(format) = token.format.as_deref() else {
            return Ok(FormatDirective::Default);
        };

        if format.is_empty() {
            return Err(FormatError::InvalidFormatSpec {
                placeholder: token.name,
                format: String::new(),
                reason: "format is empty",
            });
        }

        if let Some(width) = format.strip_suffix('d') {
            if width.bytes().all(|b| b.is_ascii_digit()) {
                if token.name != PlaceholderName::Count {
                    return Err(incompatible(token, format));
                }
                let width = if width.is_empty() {
                    0
                } else {
                    width
                        .parse::<usize>()
                        .ok()
                        .filter(|w| *w <= MAX_PAD_WIDTH)
                        .ok_or_else(|| FormatError::InvalidFormatSpec {
                            placeholder: token.name,
                            format: format.to_string(),
                            reason: "padding width too large",
                        })?
                };
                return Ok(FormatDirective::ZeroPad { width });
            }
        }

        if token.name != PlaceholderName::Timestamp {
            return Err(incompatible(token, format));
        }
        Ok(FormatDirective::Date(DatePattern::compile(format)))
    }

    /// Render a value.
    ///
    /// Directives are classified per placeholder, so a value of another kind
    /// falls back to its default rendering.
    pub fn apply(&self, value: &PlaceholderValue) -> String {
        match (self, value) {
            (FormatDirective::ZeroPad { width }, PlaceholderValue::Count(n)) => {
                format!("{n:0width$}", width = *width)
            }
            (FormatDirective::Date(pattern), PlaceholderValue::Timestamp(ts)) => {
                pattern.format(ts)
            }
            _ => value.render_default(),
        }
    }
}

fn incompatible(token: &PlaceholderToken, format: &str) -> FormatError {
    FormatError::IncompatibleFormat {
        placeholder: token.name,
        format: format.to_string(),
    }
}

/// Render `value` for `token`, applying the token's format directive.
pub fn render(token: &PlaceholderToken, value: &PlaceholderValue) -> Result<String, FormatError> {
    Ok(FormatDirective::for_token(token)?.apply(value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateItem {
    Literal(String),
    Chrono(&'static str),
    EpochMillis,
}

/// Date pattern such as `YYYY-MM-DD HH:mm:ss`.
///
/// Text inside `[...]` is emitted verbatim; characters that are not pattern
/// tokens pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    items: Vec<DateItem>,
}

// Longest tokens first
const DATE_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("SSS", "%3f"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("M", "%-m"),
    ("D", "%-d"),
    ("H", "%-H"),
    ("h", "%-I"),
    ("m", "%-M"),
    ("s", "%-S"),
    ("A", "%p"),
    ("Z", "%:z"),
    ("X", "%s"),
];

impl DatePattern {
    pub fn compile(pattern: &str) -> Self {
        let mut items = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(c) = rest.chars().next() {
            if c == '[' {
                if let Some(close) = rest.find(']') {
                    literal.push_str(&rest[1..close]);
                    rest = &rest[close + 1..];
                    continue;
                }
            }

            if let Some(stripped) = rest.strip_prefix('x') {
                flush_literal(&mut items, &mut literal);
                items.push(DateItem::EpochMillis);
                rest = stripped;
                continue;
            }

            if let Some(&(token, spec)) = DATE_TOKENS.iter().find(|(t, _)| rest.starts_with(*t)) {
                flush_literal(&mut items, &mut literal);
                items.push(DateItem::Chrono(spec));
                rest = &rest[token.len()..];
                continue;
            }

            literal.push(c);
            rest = &rest[c.len_utf8()..];
        }
        flush_literal(&mut items, &mut literal);

        Self { items }
    }

    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        let mut out = String::new();
        for item in &self.items {
            match item {
                DateItem::Literal(text) => out.push_str(text),
                DateItem::Chrono(spec) => out.push_str(&instant.format(spec).to_string()),
                DateItem::EpochMillis => out.push_str(&instant.timestamp_millis().to_string()),
            }
        }
        out
    }
}

fn flush_literal(items: &mut Vec<DateItem>, literal: &mut String) {
    if !literal.is_empty() {
        items.push(DateItem::Literal(std::mem::take(literal)));
    }
}
