//! HTTP-level tests for the OpenAI completion client against a mock server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kabuto_core::{ApiError, CompletionClient, CompletionConfig, OpenAiClient};
use mockito::Matcher;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn client_for(server: &mockito::Server) -> OpenAiClient {
    let config = CompletionConfig::new("sk-test")
        .with_base_url(format!("{}/v1", server.url()))
        .with_timeout(Duration::from_secs(5));
    OpenAiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_successful_completion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 500
            })),
            Matcher::Regex(r#""role":"system""#.to_string()),
            Matcher::Regex(r#""role":"user","content":"hello""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "hi there"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let reply = client_for(&server).generate_reply("hello").await.unwrap();

    assert_eq!(reply, "hi there");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_is_not_retryable_and_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
        .expect(1)
        .create_async()
        .await;

    let err = client_for(&server).generate_reply("hello").await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 401, .. }));
    assert!(!err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_quota_exceeded_is_retryable_but_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"You exceeded your current quota"}}"#)
        .expect(1)
        .create_async()
        .await;

    let err = client_for(&server).generate_reply("hello").await.unwrap_err();

    assert!(err.is_retryable());
    assert!(!err.is_transient_network());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .create_async()
        .await;

    let err = client_for(&server).generate_reply("hello").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let err = client_for(&server).generate_reply("hello").await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Reserve a port, then free it so nothing listens there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = CompletionConfig::new("sk-test")
        .with_base_url(format!("http://127.0.0.1:{}/v1", port))
        .with_timeout(Duration::from_secs(2));
    let client = OpenAiClient::new(config).unwrap();

    let err = client.generate_reply("hello").await.unwrap_err();

    assert!(err.is_transient_network(), "unexpected error: {:?}", err);
    assert!(err.is_retryable());
}

const COMPLETION_BODY: &str =
    r#"{"choices":[{"message":{"role":"assistant","content":"second try"}}]}"#;

/// Listener that drops the first `drop_first` connections without answering
/// and serves a completion on the rest. Returns the API base and the number
/// of accepted connections.
async fn flaky_server(drop_first: usize) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/v1", listener.local_addr().unwrap());
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < drop_first {
                drop(stream);
                continue;
            }
            tokio::spawn(answer(stream));
        }
    });

    (base, accepted)
}

async fn answer(mut stream: TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let Ok(read) = stream.read(&mut buf).await else {
            return;
        };
        if read == 0 {
            return;
        }
        request.extend_from_slice(&buf[..read]);
        if request_complete(&request) {
            break;
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        COMPLETION_BODY.len(),
        COMPLETION_BODY
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

fn client_at(base: &str, retry: bool) -> OpenAiClient {
    let config = CompletionConfig::new("sk-test")
        .with_base_url(base)
        .with_timeout(Duration::from_secs(5))
        .with_retry_on_network(retry);
    OpenAiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_dropped_connection_retried_once() {
    let (base, accepted) = flaky_server(usize::MAX).await;

    let err = client_at(&base, true).generate_reply("hello").await.unwrap_err();

    assert!(err.is_transient_network(), "unexpected error: {:?}", err);
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retry_succeeds_on_second_attempt() {
    let (base, accepted) = flaky_server(1).await;

    let reply = client_at(&base, true).generate_reply("hello").await.unwrap();

    assert_eq!(reply, "second try");
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_no_retry_when_disabled() {
    let (base, accepted) = flaky_server(usize::MAX).await;

    let err = client_at(&base, false).generate_reply("hello").await.unwrap_err();

    assert!(err.is_transient_network(), "unexpected error: {:?}", err);
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
