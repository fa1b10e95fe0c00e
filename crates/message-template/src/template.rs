//! Message template and resolved message types.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TemplateError;

/// A single message header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// User-authored message template.
///
/// Every field may contain placeholders. Header order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
}

impl MessageTemplate {
    /// Template with only a value.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(key, value));
        self
    }

    /// Load a template from a YAML, JSON or TOML file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        debug!(path = %path.display(), extension = %extension, "Loading message template");

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => serde_json::from_str(&content)
                .map_err(|e| TemplateError::Load(format!("Invalid JSON template: {e}"))),
            "toml" => toml::from_str(&content)
                .map_err(|e| TemplateError::Load(format!("Invalid TOML template: {e}"))),
            other => Err(TemplateError::Load(format!(
                "Unsupported template file extension '{other}' (expected yaml, yml, json or toml)"
            ))),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, TemplateError> {
        serde_yaml::from_str(content)
            .map_err(|e| TemplateError::Load(format!("Invalid YAML template: {e}")))
    }
}

/// A fully concrete message, ready for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMessage {
    pub key: Option<String>,
    pub value: Option<String>,
    pub headers: Vec<Header>,
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
    fn test_builder() {
        let template = MessageTemplate::with_value("v")
            .key("k-{count}")
            .header("trace", "{uuid}");
        assert_eq!(template.key.as_deref(), Some("k-{count}"));
        assert_eq!(template.value.as_deref(), Some("v"));
        assert_eq!(template.headers, vec![Header::new("trace", "{uuid}")]);
    }

    #[test]
    fn test_from_yaml_file() {
        let file = write_temp(
            ".yaml",
            r#"
key: "order-{count}"
value: '{"id":"{uuid}"}'
headers:
  - key: source
    value: kafka-send
"#,
        );
        let template = MessageTemplate::from_file(file.path()).unwrap();
        assert_eq!(template.key.as_deref(), Some("order-{count}"));
        assert_eq!(template.value.as_deref(), Some(r#"{"id":"{uuid}"}"#));
        assert_eq!(template.headers.len(), 1);
    }

    #[test]
    fn test_from_json_file_with_missing_fields() {
        let file = write_temp(".json", r#"{"value": "only value"}"#);
        let template = MessageTemplate::from_file(file.path()).unwrap();
        assert_eq!(template.key, None);
        assert!(template.headers.is_empty());
    }

    #[test]
    fn test_from_toml_file() {
        let file = write_temp(
            ".toml",
            r#"
key = "{count:04d}"
value = "at {timestamp}"

[[headers]]
key = "h"
value = "v"
"#,
        );
        let template = MessageTemplate::from_file(file.path()).unwrap();
        assert_eq!(template.key.as_deref(), Some("{count:04d}"));
        assert_eq!(template.headers[0], Header::new("h", "v"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".txt", "value: x");
        assert!(matches!(
            MessageTemplate::from_file(file.path()),
            Err(TemplateError::Load(_))
        ));
    }
}
