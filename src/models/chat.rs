// src/models/chat.rs
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Processing status reported by the backend for a chat.
///
/// The backend has historically written `processed` / `error` for the two
/// terminal states, so those spellings are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Processing,
    #[serde(alias = "processed")]
    Complete,
    #[serde(alias = "error")]
    Failed,
}

impl ChatStatus {
    /// `complete` and `failed` end polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, ChatStatus::Complete | ChatStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChatStatus::Processing => "processing",
            ChatStatus::Complete => "complete",
            ChatStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Client-side projection of a chat. Everything but `id` and `status` is
/// filled in by the backend once processing completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub status: ChatStatus,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub generated_summary: Option<String>,
    #[serde(default)]
    pub actionable_items: Option<Vec<String>>,
    #[serde(default)]
    pub suggested_questions: Option<Vec<String>>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Chat {
    /// Bare chat as returned right after creation.
    pub fn new(id: impl Into<String>, status: ChatStatus) -> Self {
        Self {
            id: id.into(),
            status,
            title: None,
            channel_name: None,
            publication_date: None,
            view_count: None,
            thumbnail_url: None,
            generated_summary: None,
            actionable_items: None,
            suggested_questions: None,
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "YOUTUBE")]
    Youtube,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub source_url: String,
    pub source_type: SourceType,
}

impl CreateChatRequest {
    pub fn youtube(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            source_type: SourceType::Youtube,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCreationResponse {
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

// The backend emits naive timestamps (no offset) for some fields and RFC 3339
// for others. Unparseable values become None instead of failing the chat.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| parse_timestamp(&value)))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_processing_chat_with_only_required_fields() {
        let chat: Chat = serde_json::from_value(json!({
            "id": "c-1",
            "status": "processing"
        }))
        .unwrap();

        assert_eq!(chat, Chat::new("c-1", ChatStatus::Processing));
        assert!(!chat.status.is_terminal());
    }

    #[test]
    fn test_completed_chat_with_backend_fields() {
        let chat: Chat = serde_json::from_value(json!({
            "id": "c-2",
            "status": "complete",
            "source_url": "https://youtu.be/dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "channel_name": "Rick Astley",
            "publication_date": "2009-10-25T06:57:33",
            "view_count": 1500000000,
            "suggested_questions": ["Who sings this?"],
            "messages": [
                {"id": "m-1", "role": "ai", "content": "Hi!", "created_at": "2024-01-01T10:00:00Z"}
            ]
        }))
        .unwrap();

        assert_eq!(chat.status, ChatStatus::Complete);
        assert_eq!(chat.view_count, Some(1_500_000_000));
        assert_eq!(
            chat.publication_date.unwrap().to_rfc3339(),
            "2009-10-25T06:57:33+00:00"
        );
        assert_eq!(chat.messages[0].role, MessageRole::Ai);
        assert!(chat.messages[0].created_at.is_some());
    }

    #[test]
    fn test_legacy_terminal_status_spellings() {
        let done: ChatStatus = serde_json::from_value(json!("processed")).unwrap();
        let broken: ChatStatus = serde_json::from_value(json!("error")).unwrap();
        assert_eq!(done, ChatStatus::Complete);
        assert_eq!(broken, ChatStatus::Failed);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_value::<Chat>(json!({"id": "x", "status": "queued"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_garbage_timestamp_is_dropped() {
        let chat: Chat = serde_json::from_value(json!({
            "id": "c-3",
            "status": "failed",
            "publication_date": "last tuesday"
        }))
        .unwrap();
        assert_eq!(chat.publication_date, None);
    }

    #[test]
    fn test_create_request_wire_format() {
        let body = serde_json::to_value(CreateChatRequest::youtube(
            "https://www.youtube.com/watch?v=abc123",
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({
                "source_url": "https://www.youtube.com/watch?v=abc123",
                "source_type": "YOUTUBE"
            })
        );
    }
}
