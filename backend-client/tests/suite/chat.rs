use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::json;
use vchat_backend_client::ChatError;
use vchat_backend_client::ChatRequest;
use vchat_backend_client::Client;
use vchat_backend_client::ImagePart;
use vchat_backend_client::Mode;
use vchat_backend_client::Turn;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::header_regex;
use wiremock::matchers::method;
use wiremock::matchers::path;

async fn only_request_body(server: &MockServer) -> String {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    String::from_utf8_lossy(&requests[0].body).into_owned()
}

#[tokio::test]
async fn chat_posts_multipart_form_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "hi there",
            "timestamp": "2025-01-01T00:00:00",
            "images_processed": 0,
            "model_used": "llama3:latest",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let request = ChatRequest {
        message: Some("hello".to_string()),
        images: Vec::new(),
        mode: Mode::Auto,
        chat_history: vec![Turn::user("hello")],
    };
    let reply = client.chat(&request).await.unwrap();

    assert_eq!(reply.response, "hi there");
    assert_eq!(reply.model_used.as_deref(), Some("llama3:latest"));

    let body = only_request_body(&server).await;
    assert!(body.contains("name=\"message\"\r\n\r\nhello\r\n"), "{body}");
    assert!(body.contains("name=\"mode\"\r\n\r\nbest\r\n"), "{body}");
    assert!(
        body.contains(r#"[{"role":"user","content":"hello"}]"#),
        "{body}"
    );
}

#[tokio::test]
async fn chat_omits_empty_message_and_sends_image_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "I see a cat"})))
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let request = ChatRequest {
        message: Some(String::new()),
        images: vec![ImagePart {
            filename: "cat.png".to_string(),
            mime: "image/png".to_string(),
            bytes: Bytes::from_static(b"\x89PNG-not-really"),
        }],
        mode: Mode::Image,
        chat_history: vec![Turn::user("")],
    };
    let reply = client.chat(&request).await.unwrap();
    assert_eq!(reply.response, "I see a cat");

    let body = only_request_body(&server).await;
    assert!(!body.contains("name=\"message\""), "{body}");
    assert!(
        body.contains("name=\"images\"; filename=\"cat.png\""),
        "{body}"
    );
    assert!(body.contains("Content-Type: image/png"), "{body}");
    assert!(body.contains("PNG-not-really"), "{body}");
    assert!(body.contains("name=\"mode\"\r\n\r\nimage\r\n"), "{body}");
    assert!(
        body.contains(r#"[{"role":"user","content":""}]"#),
        "{body}"
    );
}

#[tokio::test]
async fn chat_maps_error_status_to_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "model crashed"})))
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let request = ChatRequest {
        message: Some("ping".to_string()),
        chat_history: vec![Turn::user("ping")],
        ..Default::default()
    };
    let err = client.chat(&request).await.unwrap_err();

    match err {
        ChatError::Status {
            status, message, ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "model crashed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn chat_uses_fallback_message_without_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let err = client.chat(&ChatRequest::default()).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to get response (HTTP 502)");
}

#[tokio::test]
async fn chat_rejects_success_without_response_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"model_used": "llava"})))
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let err = client.chat(&ChatRequest::default()).await.unwrap_err();

    assert!(matches!(err, ChatError::Decode(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn chat_reports_transport_failure() {
    // Nothing listens on the discard port of the loopback interface.
    let client = Client::new("http://127.0.0.1:9").unwrap();
    let err = client.chat(&ChatRequest::default()).await.unwrap_err();

    assert!(matches!(err, ChatError::Transport(_)), "unexpected error: {err:?}");
}
