//! Placeholder template engine for kafka-send.
//!
//! This crate turns one user-authored [`MessageTemplate`] into any number of
//! concrete [`ResolvedMessage`]s. Template fields are parsed once per batch and
//! the parsed form is reused for every generated message.
//!
//! # Architecture
//!
//! ```text
//! MessageTemplate (key / value / headers)
//!        │
//!        ▼
//! ┌─────────────────┐
//! │  parser         │  parse once per batch
//! └────────┬────────┘
//!          ▼
//!   ParsedTemplate ──────────────┐
//!          │                     │ per iteration
//!          ▼                     ▼
//! ┌─────────────────┐   ┌─────────────────┐
//! │  materialize    │◄──│  Resolver       │
//! │                 │   │  - clock        │
//! │                 │   │  - uuid source  │
//! └────────┬────────┘   └────────┬────────┘
//!          │                     ▼
//!          │            ┌─────────────────┐
//!          │            │  format         │
//!          │            └─────────────────┘
//!          ▼
//!   ResolvedMessage { key, value, headers }
//! ```
//!
//! # Example
//!
//! ```rust
//! use message_template::{materialize, MessageTemplate, ParsedTemplate, Resolver};
//!
//! let template = MessageTemplate::with_value(r#"{"id":"{uuid}","seq":{count:03d}}"#);
//! let parsed = ParsedTemplate::parse(&template).unwrap();
//! parsed.validate().unwrap();
//!
//! let resolver = Resolver::system();
//! let mut context = resolver.context(7);
//! let message = materialize(&parsed, &resolver, &mut context).unwrap();
//! assert!(message.value.unwrap().ends_with(r#""seq":007}"#));
//! ```
//!
//! # Placeholders
//!
//! - `{uuid}` - fresh random UUID v4 per occurrence
//! - `{count}` - 1-based iteration index, `{count:04d}` zero-pads it
//! - `{timestamp}` - instant of the iteration, `{timestamp:YYYY-MM-DD}` formats it

pub mod error;
pub mod format;
pub mod materialize;
pub mod parser;
pub mod resolver;
pub mod template;

// Re-exports for convenience
pub use error::{FieldLocation, FormatError, ParseError, TemplateError};
pub use format::{render, DatePattern, FormatDirective, PlaceholderValue};
pub use materialize::{materialize, ParsedTemplate};
pub use parser::{parse, ParsedField, PlaceholderName, PlaceholderToken, Segment};
pub use resolver::{Clock, FixedClock, ResolutionContext, Resolver, SystemClock};
pub use template::{Header, MessageTemplate, ResolvedMessage};
