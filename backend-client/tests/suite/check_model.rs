use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use vchat_backend_client::Client;
use vchat_backend_client::ModelInfo;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

#[tokio::test]
async fn check_model_parses_available_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/check-model"))
        .and(header("user-agent", "vchat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "available": true,
            "ollama_running": true,
            "available_models": ["llava:latest", "llama3:latest"],
            "target_model": "llava:latest",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let check = client.check_model().await.unwrap();

    assert!(check.available);
    assert_eq!(check.ollama_running, Some(true));
    assert_eq!(check.target_model.as_deref(), Some("llava:latest"));
    assert_eq!(check.available_models.len(), 2);
}

#[tokio::test]
async fn check_model_reports_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/check-model"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let err = client.check_model().await.unwrap_err().to_string();

    assert!(err.contains("503"), "unexpected error: {err}");
    assert!(err.contains("down for maintenance"), "unexpected error: {err}");
}

#[tokio::test]
async fn check_model_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/check-model"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let err = client.check_model().await.unwrap_err().to_string();

    assert!(err.starts_with("Decode error for"), "unexpected error: {err}");
}

#[tokio::test]
async fn check_model_honors_status_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/check-model"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"available": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = Client::new(server.uri())
        .unwrap()
        .with_status_timeout(Duration::from_millis(100));

    assert!(client.check_model().await.is_err());
}

#[tokio::test]
async fn list_models_returns_names_and_sizes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "llava:latest", "size": 4_700_000_000u64},
                {"name": "llama3:latest"},
            ]
        })))
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let list = client.list_models().await.unwrap();

    assert_eq!(
        list.models,
        vec![
            ModelInfo {
                name: "llava:latest".to_string(),
                size: 4_700_000_000,
            },
            ModelInfo {
                name: "llama3:latest".to_string(),
                size: 0,
            },
        ]
    );
}

#[tokio::test]
async fn list_models_surfaces_backend_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"error": "Could not fetch models: 404"})),
        )
        .mount(&server)
        .await;

    let client = Client::new(server.uri()).unwrap();
    let err = client.list_models().await.unwrap_err().to_string();

    assert!(err.contains("Could not fetch models: 404"), "unexpected error: {err}");
}
