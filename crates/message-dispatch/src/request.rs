//! Dispatch request.

use message_template::MessageTemplate;

use crate::error::DispatchError;

/// Send `count` messages generated from `template` to `topic` on `server_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub server_id: String,
    pub topic: String,
    pub template: MessageTemplate,
    pub count: u64,
}

impl DispatchRequest {
    pub fn new(
        server_id: impl Into<String>,
        topic: impl Into<String>,
        template: MessageTemplate,
        count: u64,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            topic: topic.into(),
            template,
            count,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), DispatchError> {
        if self.count < 1 {
            return Err(DispatchError::Validation(format!(
                "count must be at least 1, got {}",
                self.count
            )));
        }
        if self.topic.trim().is_empty() {
            return Err(DispatchError::Validation("topic must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_count_is_rejected() {
        let request = DispatchRequest::new("local", "events", MessageTemplate::default(), 0);
        assert!(matches!(
            request.validate(),
            Err(DispatchError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_topic_is_rejected() {
        let request = DispatchRequest::new("local", "  ", MessageTemplate::default(), 1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_single_message_request_is_valid() {
        let request = DispatchRequest::new("local", "events", MessageTemplate::default(), 1);
        assert!(request.validate().is_ok());
    }
}
