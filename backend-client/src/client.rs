use std::time::Duration;

use crate::types::ChatReply;
use crate::types::ChatRequest;
use crate::types::ErrorBody;
use crate::types::ModelCheck;
use crate::types::ModelList;
use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::USER_AGENT;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use tracing::debug;

/// Failure of a single `POST /api/chat`.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The request could not be built (bad MIME type, unserializable history).
    #[error("invalid request: {0}")]
    Request(String),
    #[error("{0}")]
    Transport(String),
    /// Non-success status. `message` is the backend's `error` field when the
    /// body carried one, otherwise a generic description.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        body: String,
    },
    #[error("{0}")]
    Decode(String),
}

#[derive(Clone, Debug)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    user_agent: Option<HeaderValue>,
    status_timeout: Option<Duration>,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url,
            http,
            user_agent: None,
            status_timeout: None,
        })
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        if let Ok(hv) = HeaderValue::from_str(&ua.into()) {
            self.user_agent = Some(hv);
        }
        self
    }

    /// Bound the health and model-list queries. Chat requests are never
    /// timed out.
    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(ua) = &self.user_agent {
            h.insert(USER_AGENT, ua.clone());
        } else {
            h.insert(USER_AGENT, HeaderValue::from_static("vchat"));
        }
        h
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(url).headers(self.headers());
        match self.status_timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    pub async fn check_model(&self) -> Result<ModelCheck> {
        let url = format!("{}/api/check-model", self.base_url);
        let res = self.get(&url).send().await?;
        let status = res.status();
        let ct = content_type(&res);
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("GET {url} failed: {status}; content-type={ct}; body={body}");
        }
        match serde_json::from_str::<ModelCheck>(&body) {
            Ok(v) => Ok(v),
            Err(e) => {
                anyhow::bail!("Decode error for {url}: {e}; content-type={ct}; body={body}");
            }
        }
    }

    pub async fn list_models(&self) -> Result<ModelList> {
        let url = format!("{}/api/models", self.base_url);
        let res = self.get(&url).send().await?;
        let status = res.status();
        let ct = content_type(&res);
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            if let Some(error) = error_field(&body) {
                anyhow::bail!("GET {url} failed: {status}; {error}");
            }
            anyhow::bail!("GET {url} failed: {status}; content-type={ct}; body={body}");
        }
        match serde_json::from_str::<ModelList>(&body) {
            Ok(v) => Ok(v),
            Err(e) => {
                anyhow::bail!("Decode error for {url}: {e}; content-type={ct}; body={body}");
            }
        }
    }

    /// Submit one chat turn as `multipart/form-data`.
    pub async fn chat(&self, request: &ChatRequest) -> std::result::Result<ChatReply, ChatError> {
        let url = format!("{}/api/chat", self.base_url);
        let form = build_form(request)?;
        debug!(
            images = request.images.len(),
            history = request.chat_history.len(),
            mode = %request.mode,
            "POST {url}"
        );
        let res = self
            .http
            .post(&url)
            .headers(self.headers())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::Transport(format!("POST {url} failed: {e}")))?;
        let status = res.status();
        let ct = content_type(&res);
        let body = res
            .text()
            .await
            .map_err(|e| ChatError::Transport(format!("reading body of {url} failed: {e}")))?;
        if !status.is_success() {
            let message = error_field(&body)
                .unwrap_or_else(|| format!("Failed to get response (HTTP {})", status.as_u16()));
            return Err(ChatError::Status {
                status: status.as_u16(),
                message,
                body,
            });
        }
        serde_json::from_str::<ChatReply>(&body).map_err(|e| {
            ChatError::Decode(format!(
                "Decode error for {url}: {e}; content-type={ct}; body={body}"
            ))
        })
    }
}

fn build_form(request: &ChatRequest) -> std::result::Result<Form, ChatError> {
    let mut form = Form::new();
    if let Some(message) = request.message.as_ref().filter(|m| !m.is_empty()) {
        form = form.text("message", message.clone());
    }
    for image in &request.images {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.filename.clone())
            .mime_str(&image.mime)
            .map_err(|e| ChatError::Request(format!("image {}: {e}", image.filename)))?;
        form = form.part("images", part);
    }
    let history = serde_json::to_string(&request.chat_history)
        .map_err(|e| ChatError::Request(format!("chat_history: {e}")))?;
    Ok(form
        .text("mode", request.mode.to_string())
        .text("chat_history", history))
}

fn content_type(res: &reqwest::Response) -> String {
    res.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn error_field(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.is_empty())
}
