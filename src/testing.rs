// src/testing.rs
// Fakes shared by the unit tests. Each test builds its own instances.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use crate::api_client::{ApiError, HttpError};
use crate::models::chat::{Chat, ChatCreationResponse, ChatStatus};
use crate::services::ChatApi;
use crate::ui::landing::Navigator;

pub fn chat(id: &str, status: ChatStatus) -> Chat {
    Chat::new(id, status)
}

pub fn http_error(status: u16, body: serde_json::Value) -> ApiError {
    let code = reqwest::StatusCode::from_u16(status).unwrap();
    ApiError::Http(HttpError::new(code, body))
}

pub fn transport_error() -> ApiError {
    ApiError::Transport("error sending request: connection refused".into())
}

/// Serves a fixed script of responses per chat id and counts fetches.
/// Running past the end of a script panics so extra fetches fail the test.
#[derive(Default)]
pub struct ScriptedChatApi {
    scripts: Mutex<HashMap<String, VecDeque<Result<Chat, ApiError>>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    fetches: Mutex<HashMap<String, usize>>,
    create_responses: Mutex<VecDeque<Result<ChatCreationResponse, ApiError>>>,
    created_urls: Mutex<Vec<String>>,
    total_fetches: AtomicUsize,
}

impl ScriptedChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script<I>(self, chat_id: &str, responses: I) -> Self
    where
        I: IntoIterator<Item = Result<Chat, ApiError>>,
    {
        self.scripts
            .lock()
            .unwrap()
            .insert(chat_id.to_string(), responses.into_iter().collect());
        self
    }

    /// Every fetch for `chat_id` blocks until the returned handle is notified.
    pub fn gate(&self, chat_id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(chat_id.to_string(), notify.clone());
        notify
    }

    pub fn on_create(self, response: Result<ChatCreationResponse, ApiError>) -> Self {
        self.create_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn fetches(&self, chat_id: &str) -> usize {
        self.fetches.lock().unwrap().get(chat_id).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.total_fetches.load(Ordering::SeqCst)
    }

    pub fn created_urls(&self) -> Vec<String> {
        self.created_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for ScriptedChatApi {
    async fn create_chat(&self, source_url: &str) -> Result<ChatCreationResponse, ApiError> {
        self.created_urls.lock().unwrap().push(source_url.to_string());
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(http_error(500, json!({}))))
    }

    async fn get_chat_by_id(&self, chat_id: &str) -> Result<Chat, ApiError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(chat_id.to_string())
            .or_insert(0) += 1;
        self.total_fetches.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().get(chat_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.scripts
            .lock()
            .unwrap()
            .get_mut(chat_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("unexpected fetch for chat {chat_id}"))
    }
}

/// Records routes instead of navigating.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}
