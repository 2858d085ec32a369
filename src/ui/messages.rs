// src/ui/messages.rs
// User-facing text for every error the client can surface.

use crate::api_client::ApiError;
use crate::poller::{FetchErrorKind, PollError};

pub const INVALID_URL: &str = "Invalid YouTube URL. Please check the URL and try again.";
pub const SERVER_ERROR: &str = "Server error. Please try again later.";
pub const CONNECTIVITY: &str =
    "Unable to connect to the server. Please check your connection and try again.";
pub const GENERIC_CREATE_FAILURE: &str = "Failed to process video. Please try again.";
pub const FETCH_STATUS_FAILED: &str = "Failed to fetch chat status. Please try again.";
pub const PROCESSING_FAILED: &str = "Processing failed. Please try again.";
pub const INVALID_CHAT_ID: &str = "Invalid chat ID";

/// Message shown on the landing page when creating a chat fails.
pub fn create_chat_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Http(http) if http.status == 400 => INVALID_URL.to_string(),
        ApiError::Http(http) if http.status == 500 => SERVER_ERROR.to_string(),
        ApiError::Http(http) => http
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_CREATE_FAILURE.to_string()),
        ApiError::Transport(_) => CONNECTIVITY.to_string(),
        ApiError::Decode(_) | ApiError::InvalidRequest(_) => GENERIC_CREATE_FAILURE.to_string(),
    }
}

/// Detail line under the status page's fetch-failure banner.
pub fn poll_error_detail(err: &PollError) -> &'static str {
    match err.kind() {
        FetchErrorKind::Network => CONNECTIVITY,
        FetchErrorKind::Http(404) => "This chat could not be found.",
        FetchErrorKind::Http(status) if status >= 500 => SERVER_ERROR,
        FetchErrorKind::Http(_) | FetchErrorKind::Decode => "The server returned an unexpected response.",
    }
}
