//! Kafka implementation of [`MessageSink`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use message_dispatch::{MessageSink, TransportError};
use message_template::ResolvedMessage;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cluster::{ClusterConfig, ClusterRegistry};
use crate::error::KafkaSinkError;

/// Producer tuning shared by every cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerSettings {
    /// librdkafka `message.timeout.ms`.
    pub message_timeout_ms: u64,
    /// How long a send may wait for room in the producer queue.
    pub delivery_timeout_secs: u64,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            message_timeout_ms: 30_000,
            delivery_timeout_secs: 30,
        }
    }
}

/// Sends materialized messages to the cluster named by the request's server id.
///
/// One `FutureProducer` is created per cluster on first use and reused for
/// every later send.
pub struct KafkaSink {
    registry: ClusterRegistry,
    settings: ProducerSettings,
    producers: Mutex<HashMap<String, FutureProducer>>,
}

impl KafkaSink {
    pub fn new(registry: ClusterRegistry, settings: ProducerSettings) -> Self {
        Self {
            registry,
            settings,
            producers: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    /// Client configuration for one cluster; cluster properties override
    /// the defaults.
    pub fn client_config(&self, cluster: &ClusterConfig) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", cluster.bootstrap_servers())
            .set(
                "message.timeout.ms",
                self.settings.message_timeout_ms.to_string(),
            );
        for (key, value) in &cluster.properties {
            config.set(key, value);
        }
        config
    }

    fn producer(&self, server_id: &str) -> Result<FutureProducer, KafkaSinkError> {
        let mut producers = self.producers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(producer) = producers.get(server_id) {
            return Ok(producer.clone());
        }

        let cluster = self.registry.get(server_id)?;
        let producer: FutureProducer = self.client_config(cluster).create()?;
        info!(
            server_id,
            bootstrap_servers = %cluster.bootstrap_servers(),
            "Created Kafka producer"
        );
        producers.insert(server_id.to_string(), producer.clone());
        Ok(producer)
    }

    /// Create a topic if it doesn't exist.
    pub async fn create_topic(
        &self,
        server_id: &str,
        topic: &str,
        partitions: i32,
        replication: i32,
    ) -> Result<(), KafkaSinkError> {
        let cluster = self.registry.get(server_id)?;
        let admin_client: AdminClient<DefaultClientContext> =
            self.client_config(cluster).create()?;

        let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(replication));
        let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(10)));

        let results = admin_client
            .create_topics(&[new_topic], &opts)
            .await
            .map_err(|e| KafkaSinkError::TopicCreation(format!("Failed to create topic: {e}")))?;

        for result in results {
            match result {
                Ok(topic_name) => {
                    info!("Topic '{}' created successfully", topic_name);
                }
                Err((topic_name, err)) => {
                    let err_str = err.to_string();
                    if err_str.contains("already exists")
                        || err_str.contains("TopicExistsException")
                    {
                        info!("Topic '{}' already exists", topic_name);
                    } else {
                        return Err(KafkaSinkError::TopicCreation(format!(
                            "Failed to create topic {topic_name}: {err}"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn owned_headers(message: &ResolvedMessage) -> OwnedHeaders {
    message.headers.iter().fold(
        OwnedHeaders::new_with_capacity(message.headers.len()),
        |headers, header| {
            headers.insert(Header {
                key: &header.key,
                value: Some(header.value.as_str()),
            })
        },
    )
}

#[async_trait]
impl MessageSink for KafkaSink {
    async fn send(
        &self,
        server_id: &str,
        topic: &str,
        message: &ResolvedMessage,
    ) -> Result<(), TransportError> {
        let producer = self
            .producer(server_id)
            .map_err(|e| TransportError::new(e.to_string()))?;

        let mut record: FutureRecord<'_, str, str> =
            FutureRecord::to(topic).headers(owned_headers(message));
        if let Some(key) = &message.key {
            record = record.key(key.as_str());
        }
        if let Some(value) = &message.value {
            record = record.payload(value.as_str());
        }

        producer
            .send(record, Duration::from_secs(self.settings.delivery_timeout_secs))
            .await
            .map_err(|(err, _)| TransportError::new(err.to_string()))?;

        debug!(server_id, topic, "Delivered message");
        Ok(())
    }
}
