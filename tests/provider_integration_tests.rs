use parley::inference::{
    CompletionProvider, CompletionRequest, Message, OpenAiProvider, Role, StreamChunk,
    TransportError,
};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn test_messages() -> Vec<Message> {
    vec![
        Message::new(Role::System, "be brief"),
        Message::new(Role::User, "Hello"),
    ]
}

/// SSE body with one `data:` line per delta, then `[DONE]`.
fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let payload = json!({"choices": [{"index": 0, "delta": {"content": delta}}]});
        body.push_str(&format!("data: {payload}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

async fn mount_sse(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Runs one completion and collects everything the provider sent.
async fn stream(
    provider: &OpenAiProvider,
    messages: &[Message],
) -> (Result<(), TransportError>, Vec<StreamChunk>) {
    let (tx, mut rx) = mpsc::channel(100);
    let request = CompletionRequest {
        messages,
        model: "test-model",
    };
    let result = provider.stream_completion(request, tx).await;
    let mut chunks = Vec::new();
    while let Some(chunk) = rx.recv().await {
        chunks.push(chunk);
    }
    (result, chunks)
}

fn content(chunks: &[StreamChunk]) -> String {
    chunks
        .iter()
        .filter_map(|chunk| match chunk {
            StreamChunk::Content(text) => Some(text.as_str()),
            StreamChunk::Completed => None,
        })
        .collect()
}

// ============================================================================
// OpenAI Provider Tests
// ============================================================================

#[tokio::test]
async fn test_successful_streaming() {
    let server = MockServer::start().await;
    mount_sse(&server, sse_body(&["Hello", " world"])).await;

    let provider = OpenAiProvider::new("test-key".to_string(), Some(server.uri()));
    let (result, chunks) = stream(&provider, &test_messages()).await;

    assert!(result.is_ok(), "stream failed: {result:?}");
    assert_eq!(
        chunks,
        vec![
            StreamChunk::Content("Hello".to_string()),
            StreamChunk::Content(" world".to_string()),
            StreamChunk::Completed,
        ]
    );
}

#[tokio::test]
async fn test_request_carries_key_model_and_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer secret-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": true,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_body(&["ok"])))
        .expect(1)
        .mount(&server)
        .await;

    // Trailing slash on the base URL is tolerated
    let provider = OpenAiProvider::new("secret-key".to_string(), Some(format!("{}/", server.uri())));
    let (result, chunks) = stream(&provider, &test_messages()).await;

    assert!(result.is_ok(), "stream failed: {result:?}");
    assert_eq!(content(&chunks), "ok");
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("bad-key".to_string(), Some(server.uri()));
    let (result, chunks) = stream(&provider, &test_messages()).await;

    assert_eq!(
        result,
        Err(TransportError::Api {
            status: 401,
            message: "invalid api key".to_string()
        })
    );
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn test_error_event_mid_stream() {
    let server = MockServer::start().await;
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n\
                data: {\"error\":{\"message\":\"overloaded\"}}\n\n";
    mount_sse(&server, body.to_string()).await;

    let provider = OpenAiProvider::new("test-key".to_string(), Some(server.uri()));
    let (result, chunks) = stream(&provider, &test_messages()).await;

    assert!(matches!(result, Err(TransportError::Api { ref message, .. }) if message == "overloaded"));
    assert_eq!(content(&chunks), "partial");
}

#[tokio::test]
async fn test_malformed_payload_is_parse_error() {
    let server = MockServer::start().await;
    mount_sse(&server, "data: {not json}\n\n".to_string()).await;

    let provider = OpenAiProvider::new("test-key".to_string(), Some(server.uri()));
    let (result, _) = stream(&provider, &test_messages()).await;

    assert!(matches!(result, Err(TransportError::Parse(_))), "{result:?}");
}

#[tokio::test]
async fn test_comments_and_empty_deltas_are_skipped() {
    let server = MockServer::start().await;
    let body = ": keep-alive\n\n\
                data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n\
                data: {\"choices\":[{\"delta\":{\"content\":\"text\"}}]}\n\n\
                data: [DONE]\n\n";
    mount_sse(&server, body.to_string()).await;

    let provider = OpenAiProvider::new("test-key".to_string(), Some(server.uri()));
    let (result, chunks) = stream(&provider, &test_messages()).await;

    assert!(result.is_ok());
    assert_eq!(
        chunks,
        vec![StreamChunk::Content("text".to_string()), StreamChunk::Completed]
    );
}

#[tokio::test]
async fn test_stream_without_done_still_succeeds() {
    let server = MockServer::start().await;
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"cut off\"}}]}\n\n";
    mount_sse(&server, body.to_string()).await;

    let provider = OpenAiProvider::new("test-key".to_string(), Some(server.uri()));
    let (result, chunks) = stream(&provider, &test_messages()).await;

    assert!(result.is_ok());
    assert_eq!(chunks, vec![StreamChunk::Content("cut off".to_string())]);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 9 (discard) in the test environment
    let provider = OpenAiProvider::new("test-key".to_string(), Some("http://127.0.0.1:9".to_string()));
    let (result, chunks) = stream(&provider, &test_messages()).await;

    assert!(matches!(result, Err(TransportError::Network(_))), "{result:?}");
    assert!(chunks.is_empty());
}
