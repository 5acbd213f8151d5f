use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use super::types::{Message, StreamChunk};

/// Errors that can end a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Network-level failure (timeout, DNS, connection refused, dropped body).
    Network(String),
    /// API returned a non-success status.
    Api { status: u16, message: String },
    /// The response stream could not be understood.
    Parse(String),
    /// The receiving side went away.
    ChannelClosed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            TransportError::Parse(msg) => write!(f, "parse error: {msg}"),
            TransportError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Everything a provider needs to fulfil a completion request.
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub model: &'a str,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Streams a completion, sending deltas to `sender` in arrival order.
    ///
    /// Returns when the response ends. Dropping `sender` on return tells the
    /// receiver that no more chunks will follow.
    async fn stream_completion(
        &self,
        request: CompletionRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), TransportError>;
}
