// src/models/mod.rs
pub mod chat;

pub use chat::{Chat, ChatCreationResponse, ChatMessage, ChatStatus, CreateChatRequest, MessageRole, SourceType};
