use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn vchat_command(vchat_home: &Path, base_url: &str) -> Result<Command> {
    let mut cmd = Command::cargo_bin("vchat")?;
    cmd.env("VCHAT_HOME", vchat_home)
        .env("VCHAT_BASE_URL", base_url)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn help_lists_flags() -> Result<()> {
    let mut cmd = Command::cargo_bin("vchat")?;
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("--base-url"))
        .stdout(contains("--mode"));
    Ok(())
}

#[test]
fn unavailable_backend_refuses_sends() -> Result<()> {
    let home = TempDir::new()?;
    let mut cmd = vchat_command(home.path(), "http://127.0.0.1:9")?;
    cmd.write_stdin("hello\n/quit\n")
        .assert()
        .success()
        .stdout(contains("unavailable Cannot connect to backend server"))
        .stdout(contains("The model is not available"));
    Ok(())
}

#[test]
fn invalid_mode_in_config_fails_startup() -> Result<()> {
    let home = TempDir::new()?;
    fs::write(home.path().join("config.toml"), "mode = \"video\"\n")?;
    let mut cmd = vchat_command(home.path(), "http://127.0.0.1:9")?;
    cmd.write_stdin("")
        .assert()
        .failure()
        .stderr(contains("invalid mode `video`"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn sends_message_and_prints_reply() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/check-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "available": true,
            "target_model": "llama3:latest",
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "hi there"})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new()?;
    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || -> Result<std::process::Output> {
        let mut cmd = vchat_command(home.path(), &uri)?;
        Ok(cmd.write_stdin("/mode text\nhello\n").output()?)
    })
    .await??;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("available llama3:latest"), "{stdout}");
    assert!(stdout.contains("mode: text"), "{stdout}");
    assert!(stdout.contains("thinking..."), "{stdout}");
    assert!(stdout.contains("assistant: hi there"), "{stdout}");

    let requests = server.received_requests().await.unwrap_or_default();
    let chat = requests
        .iter()
        .find(|r| r.url.path() == "/api/chat")
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .unwrap_or_default();
    assert!(chat.contains("name=\"mode\"\r\n\r\ntext\r\n"), "{chat}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn image_flag_rides_with_the_first_message() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/check-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"available": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "a cat"})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new()?;
    let image_path = home.path().join("cat.png");
    image::RgbImage::new(2, 2).save(&image_path)?;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || -> Result<std::process::Output> {
        let mut cmd = vchat_command(home.path(), &uri)?;
        cmd.arg("--image").arg(&image_path);
        Ok(cmd.write_stdin("describe\n").output()?)
    })
    .await??;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("attached #"), "{stdout}");
    assert!(stdout.contains("[1 image(s): cat.png]"), "{stdout}");
    assert!(stdout.contains("assistant: a cat"), "{stdout}");

    let requests = server.received_requests().await.unwrap_or_default();
    let chat = requests
        .iter()
        .find(|r| r.url.path() == "/api/chat")
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .unwrap_or_default();
    assert!(chat.contains("name=\"images\"; filename=\"cat.png\""), "{chat}");
    Ok(())
}
