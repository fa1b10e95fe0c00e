//! Transport seam.

use std::sync::Arc;

use async_trait::async_trait;
use message_template::ResolvedMessage;
use serde::Serialize;
use thiserror::Error;

/// A single failed send.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{reason}")]
pub struct TransportError {
    pub reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Destination for materialized messages.
///
/// Implementations are supplied by the application, e.g. a Kafka producer.
/// `send` is the only place a batch suspends.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(
        &self,
        server_id: &str,
        topic: &str,
        message: &ResolvedMessage,
    ) -> Result<(), TransportError>;
}

#[async_trait]
impl<S: MessageSink + ?Sized> MessageSink for Arc<S> {
    async fn send(
        &self,
        server_id: &str,
        topic: &str,
        message: &ResolvedMessage,
    ) -> Result<(), TransportError> {
        (**self).send(server_id, topic, message).await
    }
}
