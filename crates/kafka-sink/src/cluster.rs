//! Cluster registry.
//!
//! Maps the server ids used in dispatch requests to Kafka clusters. Two
//! configuration modes are supported:
//!
//! - simple: a list of `host:port` bootstrap servers, one cluster each
//! - advanced: named clusters with an explicit broker list and extra
//!   producer properties
//!
//! In both modes the id is derived by replacing every character outside
//! `[a-zA-Z0-9\s]` with `_`, so `localhost:9092` becomes `localhost_9092`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::KafkaSinkError;

const HOST_PORT_SEPARATOR: char = ':';

/// Replace every character outside `[a-zA-Z0-9\s]` with `_`.
///
/// `\s` is the ASCII set `[ \t\n\x0B\f\r]`; other Unicode whitespace is
/// replaced too.
pub fn sanitize_cluster_id(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || c == '\x0B' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
}

impl BrokerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,
    pub brokers: Vec<BrokerConfig>,
    /// Extra librdkafka producer properties, e.g. `security.protocol`.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ClusterConfig {
    /// Comma-separated broker list for `bootstrap.servers`.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers
            .iter()
            .map(BrokerConfig::address)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Resolved set of clusters keyed by sanitized id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterRegistry {
    clusters: BTreeMap<String, ClusterConfig>,
}

impl ClusterRegistry {
    /// Build a registry from plain `host:port` bootstrap servers.
    pub fn simple<S: AsRef<str>>(bootstrap_servers: &[S]) -> Result<Self, KafkaSinkError> {
        let mut clusters = BTreeMap::new();
        for server in bootstrap_servers {
            let server = server.as_ref().trim();
            let id = sanitize_cluster_id(server);

            let (host, port) = server
                .split_once(HOST_PORT_SEPARATOR)
                .ok_or_else(|| KafkaSinkError::InvalidBootstrapServer(server.to_string()))?;
            let port: u16 = port
                .parse()
                .map_err(|_| KafkaSinkError::InvalidBootstrapServer(server.to_string()))?;
            if host.is_empty() {
                return Err(KafkaSinkError::InvalidBootstrapServer(server.to_string()));
            }

            let cluster = ClusterConfig {
                name: id.clone(),
                brokers: vec![BrokerConfig {
                    host: host.to_string(),
                    port,
                }],
                properties: BTreeMap::new(),
            };
            clusters.insert(id, cluster);
        }

        info!(
            clusters = clusters.len(),
            "Using simple cluster configuration"
        );
        Ok(Self { clusters })
    }

    /// Build a registry from named clusters.
    pub fn advanced(clusters: Vec<ClusterConfig>) -> Result<Self, KafkaSinkError> {
        let mut registry = BTreeMap::new();
        for cluster in clusters {
            let id = sanitize_cluster_id(&cluster.name);
            if cluster.brokers.is_empty() {
                return Err(KafkaSinkError::NoBrokers(cluster.name));
            }
            if registry.contains_key(&id) {
                return Err(KafkaSinkError::DuplicateCluster(id));
            }
            registry.insert(id, cluster);
        }

        info!(
            clusters = registry.len(),
            "Using advanced cluster configuration"
        );
        Ok(Self {
            clusters: registry,
        })
    }

    pub fn get(&self, server_id: &str) -> Result<&ClusterConfig, KafkaSinkError> {
        self.clusters
            .get(server_id)
            .ok_or_else(|| KafkaSinkError::UnknownCluster(server_id.to_string()))
    }

    pub fn bootstrap_servers(&self, server_id: &str) -> Result<String, KafkaSinkError> {
        self.get(server_id).map(ClusterConfig::bootstrap_servers)
    }

    /// Known server ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClusterConfig)> {
        self.clusters.iter().map(|(id, c)| (id.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(name: &str, brokers: &[(&str, u16)]) -> ClusterConfig {
        ClusterConfig {
            name: name.to_string(),
            brokers: brokers
                .iter()
                .map(|(host, port)| BrokerConfig {
                    host: host.to_string(),
                    port: *port,
                })
                .collect(),
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn test_sanitize_cluster_id() {
        assert_eq!(sanitize_cluster_id("localhost:9092"), "localhost_9092");
        assert_eq!(sanitize_cluster_id("kafka-1.local:9093"), "kafka_1_local_9093");
        assert_eq!(sanitize_cluster_id("Prod Cluster"), "Prod Cluster");
    }

    #[test]
    fn test_sanitize_keeps_only_ascii_whitespace() {
        assert_eq!(sanitize_cluster_id("a\tb\x0Bc"), "a\tb\x0Bc");
        assert_eq!(sanitize_cluster_id("prod\u{00A0}eu"), "prod_eu");
        assert_eq!(sanitize_cluster_id("prod\u{3000}eu"), "prod_eu");
        assert_eq!(sanitize_cluster_id("klaster\u{017C}"), "klaster_");
    }

    #[test]
    fn test_simple_registry() {
        let registry = ClusterRegistry::simple(&["localhost:9092", " broker:19092 "]).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["broker_19092", "localhost_9092"]
        );
        assert_eq!(
            registry.bootstrap_servers("localhost_9092").unwrap(),
            "localhost:9092"
        );
        assert_eq!(registry.get("broker_19092").unwrap().brokers[0].port, 19092);
    }

    #[test]
    fn test_simple_registry_requires_port() {
        let err = ClusterRegistry::simple(&["localhost"]).unwrap_err();
        assert!(matches!(err, KafkaSinkError::InvalidBootstrapServer(s) if s == "localhost"));

        assert!(ClusterRegistry::simple(&["localhost:abc"]).is_err());
        assert!(ClusterRegistry::simple(&[":9092"]).is_err());
    }

    #[test]
    fn test_advanced_registry() {
        let registry = ClusterRegistry::advanced(vec![
            cluster("prod-eu", &[("k1", 9092), ("k2", 9092)]),
            cluster("dev", &[("localhost", 9092)]),
        ])
        .unwrap();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["dev", "prod_eu"]);
        assert_eq!(registry.bootstrap_servers("prod_eu").unwrap(), "k1:9092,k2:9092");
    }

    #[test]
    fn test_advanced_registry_rejects_duplicates() {
        let err = ClusterRegistry::advanced(vec![
            cluster("prod.eu", &[("k1", 9092)]),
            cluster("prod-eu", &[("k2", 9092)]),
        ])
        .unwrap_err();
        assert!(matches!(err, KafkaSinkError::DuplicateCluster(id) if id == "prod_eu"));
    }

    #[test]
    fn test_advanced_registry_rejects_empty_broker_list() {
        let err = ClusterRegistry::advanced(vec![cluster("empty", &[])]).unwrap_err();
        assert!(matches!(err, KafkaSinkError::NoBrokers(_)));
    }

    #[test]
    fn test_unknown_cluster() {
        let registry = ClusterRegistry::simple(&["localhost:9092"]).unwrap();
        let err = registry.get("localhost:9092").unwrap_err();
        assert_eq!(err.to_string(), "Unknown cluster 'localhost:9092'");
    }
}
