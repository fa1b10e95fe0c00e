//! Template field tokenizer.
//!
//! A placeholder is `{name}` or `{name:format}` where `name` is one of
//! `uuid`, `count` or `timestamp`. A `{` opens a placeholder when it is
//! immediately followed by an identifier and then `}` or `:`. A brace whose
//! text up to the next `}` holds JSON structure is literal (so JSON payloads
//! can be used as templates) and must be balanced; anything else between
//! braces is a misspelled placeholder and is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// The recognized placeholder names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderName {
    Uuid,
    Count,
    Timestamp,
}

impl PlaceholderName {
    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uuid" => Some(PlaceholderName::Uuid),
            "count" => Some(PlaceholderName::Count),
            "timestamp" => Some(PlaceholderName::Timestamp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderName::Uuid => "uuid",
            PlaceholderName::Count => "count",
            PlaceholderName::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for PlaceholderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placeholder occurrence inside a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub name: PlaceholderName,
    /// Text after the colon, `Some("")` for `{count:}`.
    pub format: Option<String>,
    /// Byte offset of the opening `{`.
    pub source_start: usize,
    /// Byte offset one past the closing `}`.
    pub source_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(PlaceholderToken),
}

/// A field split into literal text and placeholder tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedField {
    source: String,
    segments: Vec<Segment>,
}

impl ParsedField {
    /// The original field text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &PlaceholderToken> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(token) => Some(token),
            Segment::Literal(_) => None,
        })
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders().count()
    }

    /// True when the field contains no placeholders.
    pub fn is_literal(&self) -> bool {
        self.placeholder_count() == 0
    }

    /// Original text of the token at `segment_index`, or `None` for literals.
    pub fn source_text(&self, segment_index: usize) -> Option<&str> {
        match self.segments.get(segment_index)? {
            Segment::Placeholder(token) => Some(&self.source[token.source_start..token.source_end]),
            Segment::Literal(_) => None,
        }
    }
}

/// Parse a template field into literal and placeholder segments.
pub fn parse(field: &str) -> Result<ParsedField, ParseError> {
    let bytes = field.as_bytes();
    let mut segments = Vec::new();
    // Offsets of literal `{` still waiting for their `}`
    let mut open_braces: Vec<usize> = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => match scan_placeholder(field, pos)? {
                Some(token) => {
                    if literal_start < pos {
                        segments.push(Segment::Literal(field[literal_start..pos].to_string()));
                    }
                    pos = token.source_end;
                    literal_start = pos;
                    segments.push(Segment::Placeholder(token));
                }
                None => {
                    open_braces.push(pos);
                    pos += 1;
                }
            },
            b'}' => {
                if open_braces.pop().is_none() {
                    return Err(ParseError::MalformedSyntax {
                        offset: pos,
                        reason: "unmatched closing brace",
                    });
                }
                pos += 1;
            }
            _ => pos += 1,
        }
    }

    if let Some(&offset) = open_braces.first() {
        return Err(ParseError::MalformedSyntax {
            offset,
            reason: "unmatched opening brace",
        });
    }

    if literal_start < bytes.len() {
        segments.push(Segment::Literal(field[literal_start..].to_string()));
    }

    Ok(ParsedField {
        source: field.to_string(),
        segments,
    })
}

/// Try to read a placeholder whose `{` sits at `start`.
///
/// Returns `Ok(None)` when the brace is literal text.
fn scan_placeholder(field: &str, start: usize) -> Result<Option<PlaceholderToken>, ParseError> {
    let bytes = field.as_bytes();
    let body_start = start + 1;

    match bytes.get(body_start) {
        None => return Err(ParseError::UnterminatedPlaceholder { offset: start }),
        Some(b'}') => {
            return Err(ParseError::MalformedSyntax {
                offset: start,
                reason: "empty placeholder body",
            })
        }
        Some(&c) if is_ident_start(c) => {}
        Some(_) => return reject_attempted_placeholder(field, start),
    }

    let mut name_end = body_start;
    while name_end < bytes.len() && is_ident_continue(bytes[name_end]) {
        name_end += 1;
    }

    let (format, close) = match bytes.get(name_end) {
        None => return Err(ParseError::UnterminatedPlaceholder { offset: start }),
        Some(b'}') => (None, name_end),
        Some(b':') => {
            let format_start = name_end + 1;
            let mut close = format_start;
            loop {
                match bytes.get(close) {
                    None => return Err(ParseError::UnterminatedPlaceholder { offset: start }),
                    Some(b'}') => break,
                    Some(b'{') => {
                        return Err(ParseError::MalformedSyntax {
                            offset: close,
                            reason: "opening brace inside placeholder format",
                        })
                    }
                    Some(_) => close += 1,
                }
            }
            (Some(field[format_start..close].to_string()), close)
        }
        Some(_) => return reject_attempted_placeholder(field, start),
    };

    let raw_name = &field[body_start..name_end];
    let name = PlaceholderName::from_name(raw_name).ok_or_else(|| {
        ParseError::UnknownPlaceholder {
            name: raw_name.to_string(),
            offset: start,
        }
    })?;

    Ok(Some(PlaceholderToken {
        name,
        format,
        source_start: start,
        source_end: close + 1,
    }))
}

/// Decide whether a `{` that does not open a well-formed placeholder is literal.
///
/// The brace is literal when no `}` follows or when the text up to the next
/// `}` holds JSON structure (`"`, `{`, `,` or `[`). Anything else is a
/// misspelled placeholder and is rejected.
fn reject_attempted_placeholder(
    field: &str,
    start: usize,
) -> Result<Option<PlaceholderToken>, ParseError> {
    let body_start = start + 1;
    let Some(len) = field[body_start..].find('}') else {
        return Ok(None);
    };
    let body = &field[body_start..body_start + len];
    if body.contains(|c| matches!(c, '"' | '{' | ',' | '[')) {
        return Ok(None);
    }

    match body.bytes().next() {
        Some(c) if is_ident_start(c) => Err(ParseError::UnknownPlaceholder {
            name: body.split(':').next().unwrap_or(body).to_string(),
            offset: start,
        }),
        Some(b':') => Err(ParseError::MalformedSyntax {
            offset: start,
            reason: "missing placeholder name",
        }),
        Some(c) if c.is_ascii_whitespace() => Err(ParseError::MalformedSyntax {
            offset: start,
            reason: "whitespace before placeholder name",
        }),
        _ => Err(ParseError::MalformedSyntax {
            offset: start,
            reason: "invalid placeholder name",
        }),
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(parsed: &ParsedField) -> String {
        let mut out = String::new();
        for (i, segment) in parsed.segments().iter().enumerate() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(_) => out.push_str(parsed.source_text(i).unwrap()),
            }
        }
        out
    }

    #[test]
    fn test_parse_literal_only() {
        let parsed = parse("hello world").unwrap();
        assert!(parsed.is_literal());
        assert_eq!(
            parsed.segments(),
            &[Segment::Literal("hello world".to_string())]
        );
    }

    #[test]
    fn test_parse_empty_field() {
        let parsed = parse("").unwrap();
        assert!(parsed.segments().is_empty());
    }

    #[test]
    fn test_parse_placeholders_and_formats() {
        let parsed = parse("id={uuid} n={count:04d} at {timestamp:HH:mm:ss}").unwrap();
        let tokens: Vec<&PlaceholderToken> = parsed.placeholders().collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].name, PlaceholderName::Uuid);
        assert_eq!(tokens[0].format, None);
        assert_eq!(tokens[1].name, PlaceholderName::Count);
        assert_eq!(tokens[1].format.as_deref(), Some("04d"));
        assert_eq!(tokens[2].name, PlaceholderName::Timestamp);
        assert_eq!(tokens[2].format.as_deref(), Some("HH:mm:ss"));
        assert_eq!(tokens[0].source_start, 3);
        assert_eq!(tokens[0].source_end, 9);
    }

    #[test]
    fn test_parse_is_lossless() {
        let inputs = [
            "plain",
            "{uuid}",
            "a{count}b{count:3d}c",
            r#"{"id":"{uuid}","seq":{count:03d},"nested":{"ts":"{timestamp}"}}"#,
        ];
        for input in inputs {
            let parsed = parse(input).unwrap();
            assert_eq!(rebuild(&parsed), input);
            assert_eq!(parsed.source(), input);
        }
    }

    #[test]
    fn test_parse_json_braces_are_literal() {
        let parsed = parse(r#"{"id":"{uuid}","seq":{count:03d}}"#).unwrap();
        assert_eq!(parsed.placeholder_count(), 2);
        assert_eq!(
            parsed.segments()[0],
            Segment::Literal(r#"{"id":""#.to_string())
        );
    }

    #[test]
    fn test_parse_unknown_placeholder() {
        let err = parse("hello {unknown}").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownPlaceholder {
                name: "unknown".to_string(),
                offset: 6
            }
        );
    }

    #[test]
    fn test_parse_names_are_case_sensitive() {
        assert!(matches!(
            parse("{UUID}"),
            Err(ParseError::UnknownPlaceholder { ref name, .. }) if name == "UUID"
        ));
    }

    #[test]
    fn test_parse_unterminated_placeholder() {
        assert_eq!(
            parse("hello {uuid").unwrap_err(),
            ParseError::UnterminatedPlaceholder { offset: 6 }
        );
        assert_eq!(
            parse("{count:04d").unwrap_err(),
            ParseError::UnterminatedPlaceholder { offset: 0 }
        );
        assert_eq!(
            parse("trailing {").unwrap_err(),
            ParseError::UnterminatedPlaceholder { offset: 9 }
        );
    }

    #[test]
    fn test_parse_empty_body_is_malformed() {
        assert!(matches!(
            parse("a {} b"),
            Err(ParseError::MalformedSyntax { offset: 2, .. })
        ));
    }

    #[test]
    fn test_parse_unmatched_braces_are_malformed() {
        assert!(matches!(
            parse("oops }"),
            Err(ParseError::MalformedSyntax { offset: 5, .. })
        ));
        assert!(matches!(
            parse(r#"{"open": 1"#),
            Err(ParseError::MalformedSyntax { offset: 0, .. })
        ));
        assert!(matches!(
            parse("{count:0{4}d}"),
            Err(ParseError::MalformedSyntax { offset: 8, .. })
        ));
    }

    #[test]
    fn test_parse_misspelled_placeholders_are_rejected() {
        assert_eq!(
            parse("id={uuid }").unwrap_err(),
            ParseError::UnknownPlaceholder {
                name: "uuid ".to_string(),
                offset: 3
            }
        );
        assert_eq!(
            parse("id={user-id}").unwrap_err(),
            ParseError::UnknownPlaceholder {
                name: "user-id".to_string(),
                offset: 3
            }
        );
        assert!(matches!(
            parse("seq={:04d}"),
            Err(ParseError::MalformedSyntax {
                offset: 4,
                reason: "missing placeholder name"
            })
        ));
        assert!(matches!(
            parse("at={ timestamp}"),
            Err(ParseError::MalformedSyntax {
                offset: 3,
                reason: "whitespace before placeholder name"
            })
        ));
    }

    #[test]
    fn test_parse_json_structure_stays_literal() {
        let inputs = [
            r#"{ "a": 1 }"#,
            r#"{"list":[{"n":{count}}]}"#,
            r#"{"a":1,"b":{ "c":"{uuid}"}}"#,
        ];
        for input in inputs {
            let parsed = parse(input).unwrap();
            assert_eq!(rebuild(&parsed), input);
        }
        assert_eq!(parse(r#"{"list":[{"n":{count}}]}"#).unwrap().placeholder_count(), 1);
    }

    #[test]
    fn test_parse_keeps_empty_format() {
        let parsed = parse("{count:}").unwrap();
        let token = parsed.placeholders().next().unwrap();
        assert_eq!(token.format.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_multibyte_literals() {
        let parsed = parse("zażółć {count} gęślą").unwrap();
        assert_eq!(parsed.placeholder_count(), 1);
        assert_eq!(rebuild(&parsed), "zażółć {count} gęślą");
    }
}
