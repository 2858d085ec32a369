// src/ui/mod.rs
// Text renderings of the landing form and the chat status screen.
pub mod landing;
pub mod loading_state;
pub mod messages;
pub mod status_page;

pub use landing::{chat_id_from_route, chat_route, LandingPage, Navigator, SubmitOutcome};
pub use loading_state::{DisplayStatus, LoadingState};
pub use status_page::{status_screen, StatusScreen};
