//! Configuration file loading.
//!
//! The file is TOML or YAML (chosen by extension) and describes the Kafka
//! clusters plus producer tuning:
//!
//! ```toml
//! bootstrap_servers = ["localhost:9092"]
//!
//! [producer]
//! message_timeout_ms = 5000
//! delivery_timeout_secs = 10
//!
//! [[clusters]]
//! name = "prod-eu"
//! brokers = [{ host = "kafka-1.eu", port = 9092 }]
//! properties = { "security.protocol" = "SSL" }
//! ```
//!
//! When `clusters` is present the advanced mode is used and
//! `bootstrap_servers` is ignored.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use kafka_sink::{ClusterConfig, ClusterRegistry, ProducerSettings};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bootstrap_servers: Vec<String>,
    #[serde(default)]
    pub clusters: Option<Vec<ClusterConfig>>,
    #[serde(default)]
    pub producer: ProducerSettings,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path:?}"))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config = match extension.as_deref() {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config {path:?}"))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config {path:?}"))?,
            other => anyhow::bail!(
                "Unsupported config file extension {other:?} for {path:?} (expected toml, yaml or yml)"
            ),
        };

        debug!(?path, "Loaded configuration");
        Ok(config)
    }

    /// Build the cluster registry, preferring `overrides` when given.
    pub fn cluster_registry(&self, overrides: &[String]) -> anyhow::Result<ClusterRegistry> {
        let registry = if !overrides.is_empty() {
            ClusterRegistry::simple(overrides)
        } else if let Some(clusters) = &self.clusters {
            ClusterRegistry::advanced(clusters.clone())
        } else {
            ClusterRegistry::simple(&self.bootstrap_servers)
        };
        registry.context("Invalid cluster configuration")
    }
}

/// Cluster selection options shared by subcommands.
#[derive(Parser, Clone, Debug, Default)]
pub struct ClusterOpts {
    /// Configuration file (TOML or YAML)
    #[arg(long, env = "KAFKA_SEND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bootstrap servers (comma-separated host:port), overriding the config file
    #[arg(long, env = "KAFKA_BOOTSTRAP_SERVERS", value_delimiter = ',')]
    pub bootstrap_servers: Vec<String>,
}

impl ClusterOpts {
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::from_file(path),
            None => Ok(AppConfig::default()),
        }
    }

    pub fn load(&self) -> anyhow::Result<(ClusterRegistry, ProducerSettings)> {
        let config = self.load_config()?;
        let registry = config.cluster_registry(&self.bootstrap_servers)?;
        Ok((registry, config.producer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_toml_simple_config() {
        let file = write_temp(
            ".toml",
            r#"
bootstrap_servers = ["localhost:9092", "localhost:9093"]

[producer]
message_timeout_ms = 5000
"#,
        );

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.producer.message_timeout_ms, 5000);
        assert_eq!(config.producer.delivery_timeout_secs, 30);

        let registry = config.cluster_registry(&[]).unwrap();
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["localhost_9092", "localhost_9093"]
        );
    }

    #[test]
    fn test_yaml_advanced_config() {
        let file = write_temp(
            ".yaml",
            r#"
bootstrap_servers: ["ignored:9092"]
clusters:
  - name: staging
    brokers:
      - host: kafka.staging
        port: 9092
"#,
        );

        let config = AppConfig::from_file(file.path()).unwrap();
        let registry = config.cluster_registry(&[]).unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["staging"]);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = AppConfig {
            bootstrap_servers: vec!["a:1".to_string()],
            ..AppConfig::default()
        };
        let registry = config
            .cluster_registry(&["broker:29092".to_string()])
            .unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["broker_29092"]);
    }

    #[test]
    fn test_invalid_bootstrap_server() {
        let config = AppConfig {
            bootstrap_servers: vec!["no-port".to_string()],
            ..AppConfig::default()
        };
        let err = config.cluster_registry(&[]).unwrap_err();
        assert!(format!("{err:#}").contains("no-port"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".ini", "x=1");
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file extension"));
    }

    #[test]
    fn test_missing_config_defaults_to_empty() {
        let opts = ClusterOpts::default();
        let (registry, settings) = opts.load().unwrap();
        assert!(registry.is_empty());
        assert_eq!(settings, ProducerSettings::default());
    }
}
