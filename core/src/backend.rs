use async_trait::async_trait;
use vchat_backend_client::ChatReply;
use vchat_backend_client::ChatRequest;
use vchat_backend_client::Client;
use vchat_backend_client::ModelCheck;

use crate::error::SendError;

/// Transport seam between the session and the chat backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn check_model(&self) -> anyhow::Result<ModelCheck>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, SendError>;
}

#[async_trait]
impl ChatBackend for Client {
    async fn check_model(&self) -> anyhow::Result<ModelCheck> {
        Client::check_model(self).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, SendError> {
        Client::chat(self, request).await.map_err(SendError::from)
    }
}
