//! Template materialization.
//!
//! [`ParsedTemplate`] holds the parsed form of every template field together
//! with the classified format directive of each placeholder, and is built
//! once per batch. [`materialize`] is pure apart from drawing UUIDs and
//! produces one [`ResolvedMessage`] per call.

use tracing::debug;

use crate::error::{FieldLocation, FormatError, TemplateError};
use crate::format::FormatDirective;
use crate::parser::{parse, ParsedField, Segment};
use crate::resolver::{ResolutionContext, Resolver};
use crate::template::{Header, MessageTemplate, ResolvedMessage};

/// One parsed field plus the directive of each of its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TemplateField {
    parsed: ParsedField,
    directives: Vec<Result<FormatDirective, FormatError>>,
}

impl TemplateField {
    fn parse(text: &str, field: FieldLocation) -> Result<Self, TemplateError> {
        let parsed = parse(text).map_err(|source| TemplateError::Parse { field, source })?;
        let directives = parsed.placeholders().map(FormatDirective::for_token).collect();
        Ok(Self { parsed, directives })
    }
}

/// Parsed form of a [`MessageTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    key: Option<TemplateField>,
    value: Option<TemplateField>,
    headers: Vec<(TemplateField, TemplateField)>,
}

impl ParsedTemplate {
    /// Parse every field of the template and classify its format directives.
    pub fn parse(template: &MessageTemplate) -> Result<Self, TemplateError> {
        let key = template
            .key
            .as_deref()
            .map(|k| TemplateField::parse(k, FieldLocation::Key))
            .transpose()?;
        let value = template
            .value
            .as_deref()
            .map(|v| TemplateField::parse(v, FieldLocation::Value))
            .transpose()?;
        let headers = template
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                Ok((
                    TemplateField::parse(&header.key, FieldLocation::HeaderKey(i))?,
                    TemplateField::parse(&header.value, FieldLocation::HeaderValue(i))?,
                ))
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        let parsed = Self {
            key,
            value,
            headers,
        };
        debug!(
            placeholders = parsed.placeholder_count(),
            headers = parsed.headers.len(),
            "Parsed message template"
        );
        Ok(parsed)
    }

    /// Report the first format directive that cannot be applied.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for (field, template_field) in self.template_fields() {
            for directive in &template_field.directives {
                if let Err(source) = directive {
                    return Err(TemplateError::Format {
                        field,
                        source: source.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// All parsed fields with their location, in template order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldLocation, &ParsedField)> {
        self.template_fields().map(|(l, f)| (l, &f.parsed))
    }

    pub fn placeholder_count(&self) -> usize {
        self.fields().map(|(_, f)| f.placeholder_count()).sum()
    }

    fn template_fields(&self) -> impl Iterator<Item = (FieldLocation, &TemplateField)> {
        let key = self.key.iter().map(|f| (FieldLocation::Key, f));
        let value = self.value.iter().map(|f| (FieldLocation::Value, f));
        let headers = self.headers.iter().enumerate().flat_map(|(i, (k, v))| {
            [
                (FieldLocation::HeaderKey(i), k),
                (FieldLocation::HeaderValue(i), v),
            ]
        });
        key.chain(value).chain(headers)
    }
}

/// Produce one concrete message for the iteration described by `context`.
pub fn materialize(
    parsed: &ParsedTemplate,
    resolver: &Resolver,
    context: &mut ResolutionContext,
) -> Result<ResolvedMessage, TemplateError> {
    let key = parsed
        .key
        .as_ref()
        .map(|f| materialize_field(f, FieldLocation::Key, resolver, context))
        .transpose()?;
    let value = parsed
        .value
        .as_ref()
        .map(|f| materialize_field(f, FieldLocation::Value, resolver, context))
        .transpose()?;

    let mut headers = Vec::with_capacity(parsed.headers.len());
    for (i, (k, v)) in parsed.headers.iter().enumerate() {
        let key = materialize_field(k, FieldLocation::HeaderKey(i), resolver, context)?;
        let value = materialize_field(v, FieldLocation::HeaderValue(i), resolver, context)?;
        headers.push(Header { key, value });
    }

    Ok(ResolvedMessage {
        key,
        value,
        headers,
    })
}

fn materialize_field(
    template_field: &TemplateField,
    field: FieldLocation,
    resolver: &Resolver,
    context: &mut ResolutionContext,
) -> Result<String, TemplateError> {
    let parsed = &template_field.parsed;
    let mut directives = template_field.directives.iter();
    let mut out = String::with_capacity(parsed.source().len());
    for segment in parsed.segments() {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(token) => {
                let rendered = match directives.next() {
                    Some(Ok(directive)) => resolver.resolve_with(context, token.name, directive),
                    Some(Err(source)) => {
                        return Err(TemplateError::Format {
                            field,
                            source: source.clone(),
                        })
                    }
                    // One directive is stored per placeholder
                    None => resolver
                        .resolve(context, token)
                        .map_err(|source| TemplateError::Format { field, source })?,
                };
                out.push_str(&rendered);
            }
        }
    }
    Ok(out)
}
