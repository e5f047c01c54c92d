use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use moonchat_llm_api::{
    Completer, CompletionBackend, CompletionError, CompletionRequest, FileExtractor,
    MoonshotClient, RetryPolicy,
};
use moonchat_types::{Message, FALLBACK_REPLY};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    body.push_str("data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    for delta in deltas {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({"choices": [{"index": 0, "delta": {"content": delta}}]})
        ));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_stream_chat_accumulates_deltas() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "kimi-latest",
            "stream": true,
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Hi", " there", "!"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = MoonshotClient::new("sk-test".to_string(), server.uri());
    let messages = vec![Message::user("Hello")];
    let request = CompletionRequest::streaming("kimi-latest", &messages, 0.3);

    let mut deltas = Vec::new();
    let answer = client
        .stream_chat(&request, &mut |d: &str| deltas.push(d.to_string()))
        .await
        .unwrap();

    assert_eq!(answer, "Hi there!");
    assert_eq!(deltas, vec!["Hi", " there", "!"]);
}

#[tokio::test]
async fn test_server_error_is_retried_then_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;

    let client = MoonshotClient::new("sk-test".to_string(), server.uri());
    let completer = Completer::new(Arc::new(client), fast_policy(2));

    let outcome = completer
        .complete(&[Message::user("Hello")], "kimi-latest", 0.3, &mut |_: &str| {})
        .await;

    assert!(outcome.is_fallback());
    assert_eq!(outcome.text(), FALLBACK_REPLY);
}

#[tokio::test]
async fn test_unauthorized_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid Authentication"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = MoonshotClient::new("sk-bad".to_string(), server.uri());
    let messages = vec![Message::user("Hello")];
    let request = CompletionRequest::streaming("kimi-latest", &messages, 0.3);

    match client.stream_chat(&request, &mut |_: &str| {}).await {
        Err(CompletionError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid Authentication"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = MoonshotClient::new("sk-bad".to_string(), server.uri());
    let completer = Completer::new(Arc::new(client), fast_policy(3));

    let outcome = completer
        .complete(&[Message::user("Hello")], "kimi-latest", 0.3, &mut |_: &str| {})
        .await;
    assert_eq!(outcome.text(), FALLBACK_REPLY);
}

#[tokio::test]
async fn test_extract_text_uploads_retrieves_and_deletes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-abc",
            "object": "file",
            "purpose": "file-extract"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/file-abc/content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": "extracted pdf text",
            "file_type": "application/pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/files/file-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(b"%PDF-1.4 fake").unwrap();

    let client = MoonshotClient::new("sk-test".to_string(), server.uri());
    let text = client.extract_text(file.path()).await.unwrap();
    assert_eq!(text, "extracted pdf text");
}

#[tokio::test]
async fn test_extract_text_deletes_even_when_retrieval_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "file-xyz"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/file-xyz/content"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/files/file-xyz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
    file.write_all(b"not really a docx").unwrap();

    let client = MoonshotClient::new("sk-test".to_string(), server.uri());
    let result = client.extract_text(file.path()).await;
    assert!(matches!(result, Err(CompletionError::Status { status: 500, .. })));
}
