//! OpenAI-compatible provider using the Chat Completions API.
//!
//! Works with any server that speaks `POST /chat/completions` with
//! `stream: true` and answers with server-sent events:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: [DONE]
//! ```

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::inference::{CompletionProvider, CompletionRequest, Message, StreamChunk, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Chat Completions API Types
// ============================================================================

/// The request body for the Chat Completions endpoint
#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// One streamed `data:` payload
#[derive(Deserialize, Debug)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Debug, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// What a single SSE line means for the stream.
#[derive(Debug, PartialEq)]
enum SseLine {
    Delta(String),
    Done,
    Error(String),
    Ignored,
}

/// Interprets one line of the event stream.
fn parse_sse_line(line: &str) -> Result<SseLine, TransportError> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        // Blank separators, `event:` and `:` comment lines carry nothing for us.
        return Ok(SseLine::Ignored);
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|e| TransportError::Parse(format!("bad stream payload: {e}")))?;
    if let Some(error) = chunk.error {
        return Ok(SseLine::Error(error.message));
    }
    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();
    Ok(SseLine::Delta(text))
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Chat Completions provider (OpenAI or any compatible server)
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new provider.
    ///
    /// # Arguments
    /// * `api_key` - Bearer token sent with every request
    /// * `base_url` - Optional custom base URL (defaults to OpenAI's API)
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client,
        }
    }

    /// Sends a request to the completions endpoint and returns the response.
    async fn send_request(
        &self,
        request: &ChatRequest<'_>,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        debug!("Completion response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Completion API error: {} - {}", status, err_body);
            return Err(TransportError::Api {
                status,
                message: err_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), TransportError> {
        let chat_request = ChatRequest {
            model: request.model,
            messages: request.messages,
            stream: true,
        };

        info!(
            "Chat completion request: model={}, message_count={}",
            request.model,
            request.messages.len()
        );

        let response = self.send_request(&chat_request).await?;
        let status = response.status().as_u16();
        let mut body = response.bytes_stream();

        // Bytes are buffered until a full line is available so multi-byte
        // characters split across network chunks decode correctly.
        let mut pending: Vec<u8> = Vec::new();
        let mut chunk_count = 0usize;
        let mut total_content_len = 0usize;

        while let Some(bytes) = body.next().await {
            let bytes = bytes.map_err(|e| TransportError::Network(e.to_string()))?;
            debug!("Raw chunk received: {} bytes", bytes.len());
            pending.extend_from_slice(&bytes);

            while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = pending.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line_bytes);

                match parse_sse_line(&line)? {
                    SseLine::Delta(text) => {
                        if text.is_empty() {
                            continue;
                        }
                        chunk_count += 1;
                        total_content_len += text.len();
                        if sender.send(StreamChunk::Content(text)).await.is_err() {
                            warn!("Content chunk send failed: receiver dropped");
                            return Err(TransportError::ChannelClosed);
                        }
                    }
                    SseLine::Done => {
                        info!(
                            "Stream complete: {} chunks, {} content bytes",
                            chunk_count, total_content_len
                        );
                        if sender.send(StreamChunk::Completed).await.is_err() {
                            warn!("Completed send failed: receiver dropped");
                            return Err(TransportError::ChannelClosed);
                        }
                        return Ok(());
                    }
                    SseLine::Error(message) => {
                        warn!("Error event in stream: {}", message);
                        return Err(TransportError::Api { status, message });
                    }
                    SseLine::Ignored => {}
                }
            }
        }

        info!(
            "Stream ended without [DONE]: {} chunks, {} content bytes",
            chunk_count, total_content_len
        );
        Ok(())
    }
}
