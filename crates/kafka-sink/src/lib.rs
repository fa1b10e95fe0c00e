//! Kafka transport for templated message batches.
//!
//! [`KafkaSink`] implements [`message_dispatch::MessageSink`] on top of
//! `rdkafka`'s `FutureProducer`. Server ids are resolved through a
//! [`ClusterRegistry`], built either from plain bootstrap servers or from
//! named cluster definitions.
//!
//! ```rust,no_run
//! use kafka_sink::{ClusterRegistry, KafkaSink, ProducerSettings};
//!
//! # async fn example() -> Result<(), kafka_sink::KafkaSinkError> {
//! let registry = ClusterRegistry::simple(&["localhost:9092"])?;
//! let sink = KafkaSink::new(registry, ProducerSettings::default());
//! sink.create_topic("localhost_9092", "orders", 3, 1).await?;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod error;
pub mod sink;

pub use cluster::{sanitize_cluster_id, BrokerConfig, ClusterConfig, ClusterRegistry};
pub use error::KafkaSinkError;
pub use sink::{KafkaSink, ProducerSettings};
