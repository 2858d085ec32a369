// src/ui/landing.rs
// URL submission form: validate, create the chat, navigate to its status page.

use std::sync::Arc;

use tracing::{error, info};

use crate::api_client::ApiError;
use crate::models::chat::ChatCreationResponse;
use crate::services::ChatApi;
use crate::ui::messages::create_chat_error_message;
use crate::validation::{extract_video_id, validate_youtube_url, UrlValidationError};

const CHAT_ROUTE_PREFIX: &str = "/chat/";

/// Where the form sends the user after a chat is created.
pub trait Navigator: Send + Sync {
    fn push(&self, route: &str);
}

pub fn chat_route(chat_id: &str) -> String {
    format!("{}{}", CHAT_ROUTE_PREFIX, urlencoding::encode(chat_id))
}

/// Chat id from a `/chat/{id}` route, if the route is one.
pub fn chat_id_from_route(route: &str) -> Option<String> {
    let encoded = route.strip_prefix(CHAT_ROUTE_PREFIX)?;
    let encoded = encoded.split(['?', '#']).next().unwrap_or_default();
    if encoded.is_empty() || encoded.contains('/') {
        return None;
    }
    urlencoding::decode(encoded).ok().map(|id| id.into_owned())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Rejected locally; nothing was sent.
    Invalid(UrlValidationError),
    Created {
        chat_id: String,
        route: String,
        video_id: Option<String>,
    },
    /// The backend refused or could not be reached.
    Failed(String),
}

pub struct LandingPage {
    chat_api: Arc<dyn ChatApi>,
    navigator: Arc<dyn Navigator>,
    error: Option<String>,
    is_loading: bool,
}

impl LandingPage {
    pub fn new(chat_api: Arc<dyn ChatApi>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            chat_api,
            navigator,
            error: None,
            is_loading: false,
        }
    }

    /// Inline error under the input, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_loading {
            "Processing..."
        } else {
            "Process Video"
        }
    }

    /// Validate `input` and mark the form busy. Returns the URL to send.
    pub fn begin_submit(&mut self, input: &str) -> Result<String, UrlValidationError> {
        if let Err(err) = validate_youtube_url(input) {
            self.error = Some(err.to_string());
            return Err(err);
        }
        self.error = None;
        self.is_loading = true;
        // The URL is sent as typed; the backend does its own normalization.
        Ok(input.trim().to_string())
    }

    /// Apply the backend's answer for `source_url` and clear the busy flag.
    pub fn finish_submit(
        &mut self,
        source_url: &str,
        result: Result<ChatCreationResponse, ApiError>,
    ) -> SubmitOutcome {
        self.is_loading = false;

        match result {
            Ok(created) => {
                let route = chat_route(&created.chat_id);
                info!(chat_id = %created.chat_id, %route, "chat created, navigating");
                self.navigator.push(&route);
                SubmitOutcome::Created {
                    chat_id: created.chat_id,
                    route,
                    video_id: extract_video_id(source_url),
                }
            }
            Err(err) => {
                error!(error = %err, "failed to create chat");
                let message = create_chat_error_message(&err);
                self.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    pub async fn submit(&mut self, input: &str) -> SubmitOutcome {
        let source_url = match self.begin_submit(input) {
            Ok(url) => url,
            Err(err) => return SubmitOutcome::Invalid(err),
        };
        let result = self.chat_api.create_chat(&source_url).await;
        self.finish_submit(&source_url, result)
    }
}
