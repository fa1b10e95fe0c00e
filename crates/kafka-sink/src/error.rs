//! Error types for the Kafka transport.

use thiserror::Error;

/// Errors raised while resolving clusters or talking to the broker.
#[derive(Error, Debug)]
pub enum KafkaSinkError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Unknown cluster '{0}'")]
    UnknownCluster(String),

    #[error("Could not parse bootstrap server '{0}'")]
    InvalidBootstrapServer(String),

    #[error("Cluster '{0}' has no brokers")]
    NoBrokers(String),

    #[error("Duplicate cluster id '{0}'")]
    DuplicateCluster(String),

    #[error("Topic creation error: {0}")]
    TopicCreation(String),
}
