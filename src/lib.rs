// lib.rs - Client library for the chat-with-a-video backend
pub mod api_client;
pub mod clock;
pub mod config;
pub mod models;
pub mod poller;
pub mod services;
pub mod ui;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use api_client::{ApiClient, ApiError, HttpError, RequestOptions};
pub use clock::{Clock, TokioClock};
pub use config::{ClientConfig, ConfigError};
pub use models::{Chat, ChatCreationResponse, ChatStatus};
pub use poller::{PollConfig, PollOutcome, PollPhase, PollState, StatusPoller, StatusView};
pub use services::{ChatApi, ChatService};
pub use validation::{extract_video_id, validate_youtube_url, UrlValidationError};

#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
