//! Integration tests for the event source using wiremock.

use std::sync::Arc;

use async_trait::async_trait;
use chatwire_auth_static::StaticCredentials;
use chatwire_sse::{DispatchOptions, FrameHandler, Termination, run};
use chatwire_transport::EventSource;
use chatwire_types::{ChatRequest, SseFrame, StreamError, TransportError};
use futures::StreamExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ChatRequest {
    ChatRequest::new("app-1", "gpt-4o", "Hello")
}

fn source(server: &MockServer) -> EventSource {
    EventSource::new(Arc::new(StaticCredentials::new("test-token"))).base_url(server.uri())
}

const SSE_BODY: &str = "event: metadata\ndata: {\"conversationId\":\"c1\",\"messageId\":\"m1\"}\n\n\
data: Hello\n\n\
data: World\n\n\
event: end\ndata: \n\n";

#[tokio::test]
async fn open_sends_headers_and_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "text/event-stream"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "appId": "app-1",
            "conversationId": null,
            "modelId": "gpt-4o",
            "prompt": "Hello"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(SSE_BODY),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stream = source(&server).open(&request()).await.expect("should open");
    assert_eq!(stream.status(), 200);
}

#[tokio::test]
async fn open_returns_body_unconsumed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SSE_BODY))
        .mount(&server)
        .await;

    let stream = source(&server).open(&request()).await.unwrap();
    let chunks: Vec<_> = stream.into_body().collect().await;
    let body: Vec<u8> = chunks
        .into_iter()
        .flat_map(|c| c.expect("chunk").to_vec())
        .collect();
    assert_eq!(String::from_utf8(body).unwrap(), SSE_BODY);
}

#[tokio::test]
async fn continuing_conversation_sends_its_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .and(body_json(serde_json::json!({
            "appId": "app-1",
            "conversationId": "c42",
            "modelId": "gpt-4o",
            "prompt": "Hello"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    source(&server)
        .open(&request().in_conversation("c42"))
        .await
        .expect("should open");
}

#[tokio::test]
async fn non_success_status_fails_on_open() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = source(&server).open(&request()).await.unwrap_err();
    match err {
        TransportError::Status {
            status,
            status_text,
            body,
        } => {
            assert_eq!(status, 503);
            assert_eq!(status_text, "Service Unavailable");
            assert_eq!(body, "overloaded");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn large_error_body_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(502).set_body_string("e".repeat(200 * 1024)))
        .mount(&server)
        .await;

    let err = source(&server).open(&request()).await.unwrap_err();
    match err {
        TransportError::Status { status, body, .. } => {
            assert_eq!(status, 502);
            assert_eq!(body.len(), 64 * 1024);
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = source(&server).open(&request()).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!err.is_network());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let source = EventSource::new(Arc::new(StaticCredentials::new("t"))).base_url("http://127.0.0.1:1");
    let err = source.open(&request()).await.unwrap_err();
    assert!(err.is_network(), "expected network error, got {err:?}");
    assert_eq!(err.status(), None);
}

#[derive(Default)]
struct Collect {
    frames: Vec<SseFrame>,
    errors: Vec<StreamError>,
    completed: bool,
}

#[async_trait]
impl FrameHandler for Collect {
    async fn on_frame(&mut self, frame: SseFrame) {
        self.frames.push(frame);
    }
    async fn on_error(&mut self, error: StreamError) {
        self.errors.push(error);
    }
    async fn on_complete(&mut self) {
        self.completed = true;
    }
}

#[tokio::test]
async fn opened_stream_feeds_dispatch_loop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SSE_BODY))
        .mount(&server)
        .await;

    let stream = source(&server).open(&request()).await.unwrap();
    let mut collect = Collect::default();
    let outcome = run(stream, &mut collect, DispatchOptions::default()).await;

    assert_eq!(outcome, Termination::Completed { frames: 4 });
    assert!(collect.completed);
    assert!(collect.errors.is_empty());
    assert_eq!(collect.frames[1], SseFrame::message("Hello"));
    assert_eq!(collect.frames[2], SseFrame::message("World"));
}

#[tokio::test]
async fn complete_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "conversationId": "c1",
            "messageId": "m1",
            "content": "HelloWorld"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = source(&server).complete(&request()).await.unwrap();
    assert_eq!(reply.conversation_id.as_str(), "c1");
    assert_eq!(reply.message_id.as_str(), "m1");
    assert_eq!(reply.content, "HelloWorld");
}

#[tokio::test]
async fn complete_rejects_malformed_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = source(&server).complete(&request()).await.unwrap_err();
    assert!(matches!(err, TransportError::Encode(_)), "got {err:?}");
}

#[tokio::test]
async fn complete_maps_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = source(&server).complete(&request()).await.unwrap_err();
    assert_eq!(err.status(), Some(429));
}
