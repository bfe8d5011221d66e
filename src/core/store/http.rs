use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{ConversationStore, StoreError};
use crate::api::{ConversationPayload, MessageRecord};
use crate::core::message::Conversation;
use crate::utils::url::construct_api_url;

/// Store client for the `/conversations` and `/messages` JSON API.
#[derive(Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, StoreError> {
        let response = self
            .client
            .get(construct_api_url(&self.base_url, endpoint))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .post(construct_api_url(&self.base_url, endpoint))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ConversationStore for HttpStore {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        self.get_json("conversations").await
    }

    async fn save_conversation(&self, payload: &ConversationPayload) -> Result<(), StoreError> {
        self.post_json("conversations", payload).await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<MessageRecord>, StoreError> {
        self.get_json(&format!("messages/{conversation_id}")).await
    }

    async fn save_message(&self, record: &MessageRecord) -> Result<(), StoreError> {
        self.post_json("messages", record).await
    }
}
