// src/services/chat_service.rs
use async_trait::async_trait;
use reqwest::Response;
use tracing::{debug, info};

use crate::api_client::{ApiClient, ApiError, RequestOptions};
use crate::models::chat::{Chat, ChatCreationResponse, CreateChatRequest, SendMessageRequest};

pub const CHATS_PATH: &str = "/api/v1/chats";

/// The chat operations the landing page and the status poller depend on.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn create_chat(&self, source_url: &str) -> Result<ChatCreationResponse, ApiError>;
    async fn get_chat_by_id(&self, chat_id: &str) -> Result<Chat, ApiError>;
}

/// Typed facade over the chat endpoints.
#[derive(Debug, Clone)]
pub struct ChatService {
    client: ApiClient,
}

impl ChatService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn create_chat(&self, youtube_url: &str) -> Result<ChatCreationResponse, ApiError> {
        info!(source_url = youtube_url, "creating chat");
        let created: ChatCreationResponse = self
            .client
            .post_json(CHATS_PATH, &CreateChatRequest::youtube(youtube_url))
            .await?;
        info!(chat_id = %created.chat_id, "chat created");
        Ok(created)
    }

    pub async fn get_chat_by_id(&self, chat_id: &str) -> Result<Chat, ApiError> {
        debug!(chat_id, "fetching chat");
        self.client.get_json(&chat_path(chat_id)).await
    }

    /// Post a user message. The body is returned unread so the caller can
    /// consume the reply as a stream.
    pub async fn send_message(&self, chat_id: &str, message: &str) -> Result<Response, ApiError> {
        info!(chat_id, message_len = message.len(), "sending chat message");
        let body = serde_json::to_value(SendMessageRequest {
            message: message.to_string(),
        })
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        self.client
            .request(
                &format!("{}/messages", chat_path(chat_id)),
                RequestOptions::post(body),
            )
            .await
    }
}

#[async_trait]
impl ChatApi for ChatService {
    async fn create_chat(&self, source_url: &str) -> Result<ChatCreationResponse, ApiError> {
        ChatService::create_chat(self, source_url).await
    }

    async fn get_chat_by_id(&self, chat_id: &str) -> Result<Chat, ApiError> {
        ChatService::get_chat_by_id(self, chat_id).await
    }
}

pub fn chat_path(chat_id: &str) -> String {
    format!("{}/{}", CHATS_PATH, urlencoding::encode(chat_id))
}
