//! kafka-send library
//!
//! Sends batches of templated messages to Kafka. The heavy lifting lives in
//! the workspace crates:
//!
//! - `message_template` - placeholder parsing, formatting and materialization
//! - `message_dispatch` - batch dispatch, aggregation and cancellation
//! - `kafka_sink` - the Kafka transport and cluster registry
//!
//! This crate adds configuration loading and the broker-less preview sink
//! used by the CLI.
//!
//! # CLI Usage
//!
//! ```bash
//! # Send 100 messages to a local broker
//! kafka-send send --bootstrap-servers localhost:9092 --server localhost_9092 \
//!   --topic orders --template order.yaml --count 100
//!
//! # Print 3 materialized messages without a broker
//! kafka-send preview --template order.yaml --count 3
//! ```

pub mod config;
pub mod preview;

pub use config::{AppConfig, ClusterOpts};
pub use preview::PreviewSink;

pub use kafka_sink;
pub use message_dispatch;
pub use message_template;
