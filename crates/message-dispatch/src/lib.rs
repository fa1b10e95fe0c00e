//! Batch dispatch of templated messages.
//!
//! The [`Dispatcher`] turns one [`DispatchRequest`] into `count` concrete
//! messages and hands each to a [`MessageSink`]. A failed send is recorded
//! against its iteration and never stops the remaining iterations; the
//! outcome of the whole batch is summarized in a [`BatchResult`].
//!
//! # Architecture
//!
//! ```text
//! DispatchRequest { server_id, topic, template, count }
//!        │
//!        ▼
//! ┌─────────────────┐   parse + validate once
//! │   Dispatcher    │──────────────────────────► ParsedTemplate
//! │                 │
//! │ - resolver      │   for i in 1..=count (indices assigned in order)
//! │ - options       │──────────────────────────► materialize(i)
//! │ - cancellation  │                                  │
//! └────────┬────────┘                                  ▼
//!          │                                   MessageSink::send
//!          ▼                                           │
//!   ┌─────────────────┐       DispatchOutcome          │
//!   │   Aggregator    │◄───────────────────────────────┘
//!   └────────┬────────┘
//!            ▼
//!       BatchResult
//! ```
//!
//! Progressive feedback is available through [`Dispatcher::spawn_with_events`],
//! which streams [`DispatchEvent`]s while the batch runs.

pub mod aggregator;
pub mod dispatcher;
pub mod error;
pub mod request;
pub mod sink;

// Re-exports for convenience
pub use aggregator::{Aggregator, BatchResult, DispatchOutcome, DispatchStatus};
pub use dispatcher::{DispatchEvent, DispatchOptions, Dispatcher};
pub use error::DispatchError;
pub use request::DispatchRequest;
pub use sink::{MessageSink, TransportError};

pub use tokio_util::sync::CancellationToken;
