//! Broker-less sink used by `preview` and `send --dry-run`.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use message_dispatch::{MessageSink, TransportError};
use message_template::ResolvedMessage;

/// Writes every message as one JSON line instead of sending it.
pub struct PreviewSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> PreviewSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> MessageSink for PreviewSink<W> {
    async fn send(
        &self,
        _server_id: &str,
        _topic: &str,
        message: &ResolvedMessage,
    ) -> Result<(), TransportError> {
        let line = serde_json::to_string(message)
            .map_err(|e| TransportError::new(format!("Failed to encode message: {e}")))?;
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")
            .map_err(|e| TransportError::new(format!("Failed to write message: {e}")))
    }
}
