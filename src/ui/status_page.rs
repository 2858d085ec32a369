// src/ui/status_page.rs
// Maps the poll state of a chat onto what the status screen shows.

use crate::models::chat::ChatStatus;
use crate::poller::{PollPhase, PollState};
use crate::ui::loading_state::{DisplayStatus, LoadingState};
use crate::ui::messages::{poll_error_detail, FETCH_STATUS_FAILED, INVALID_CHAT_ID};

pub const COMPLETE_HEADING: &str = "Processing Complete!";
pub const COMPLETE_BODY: &str = "The video has been analyzed and is ready for chatting.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusScreen {
    InvalidChatId,
    /// First fetch still outstanding.
    Loading(LoadingState),
    /// The client could not fetch the chat.
    FetchFailed { card: LoadingState, detail: String },
    Progress(LoadingState),
    Complete { title: Option<String>, summary: Option<String> },
}

pub fn status_screen(state: &PollState) -> StatusScreen {
    if state.chat_id.is_none() {
        return StatusScreen::InvalidChatId;
    }

    if let Some(chat) = state.chat.as_ref().filter(|c| c.status == ChatStatus::Complete) {
        return StatusScreen::Complete {
            title: chat.title.clone(),
            summary: chat.generated_summary.clone(),
        };
    }

    if state.phase == PollPhase::FetchFailed {
        let detail = state
            .last_error
            .as_ref()
            .map(|err| poll_error_detail(err).to_string())
            .unwrap_or_default();
        return StatusScreen::FetchFailed {
            card: LoadingState::new(DisplayStatus::Failed).with_message(FETCH_STATUS_FAILED),
            detail,
        };
    }

    let Some(chat) = &state.chat else {
        return StatusScreen::Loading(LoadingState::new(DisplayStatus::Pending));
    };

    let card = match chat.status {
        ChatStatus::Processing => LoadingState::new(DisplayStatus::Processing).with_step(2, 3),
        ChatStatus::Failed => LoadingState::new(DisplayStatus::Failed).with_step(3, 3),
        ChatStatus::Complete => LoadingState::new(DisplayStatus::Completed).with_step(3, 3),
    };
    StatusScreen::Progress(card)
}

impl StatusScreen {
    pub fn render(&self) -> String {
        match self {
            StatusScreen::InvalidChatId => INVALID_CHAT_ID.to_string(),
            StatusScreen::Loading(card) | StatusScreen::Progress(card) => card.render(),
            StatusScreen::FetchFailed { card, detail } if detail.is_empty() => card.render(),
            StatusScreen::FetchFailed { card, detail } => format!("{}\n{}", card.render(), detail),
            StatusScreen::Complete { title, summary } => {
                let mut out = String::from(COMPLETE_HEADING);
                if let Some(title) = title {
                    out.push_str(&format!("\n{title}"));
                }
                out.push_str(&format!("\n{COMPLETE_BODY}"));
                if let Some(summary) = summary {
                    out.push_str(&format!("\n\n{summary}"));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::{FetchErrorKind, PollError};
    use crate::testing::chat;
    use crate::ui::messages::{CONNECTIVITY, PROCESSING_FAILED};

    fn polling(chat_id: &str) -> PollState {
        PollState {
            generation: 1,
            chat_id: Some(chat_id.to_string()),
            phase: PollPhase::Polling,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_id() {
        let screen = status_screen(&PollState::default());
        assert_eq!(screen, StatusScreen::InvalidChatId);
        assert_eq!(screen.render(), "Invalid chat ID");
    }

    #[test]
    fn test_loading_before_first_response() {
        let screen = status_screen(&polling("c1"));
        assert_eq!(screen, StatusScreen::Loading(LoadingState::new(DisplayStatus::Pending)));
        assert!(screen.render().contains("Starting processing..."));
    }

    #[test]
    fn test_processing_shows_step_two() {
        let mut state = polling("c1");
        state.chat = Some(chat("c1", ChatStatus::Processing));
        let screen = status_screen(&state);
        assert!(screen.render().contains("Step 2/3: Analyzing content..."));
    }

    #[test]
    fn test_complete_screen() {
        let mut done = chat("c1", ChatStatus::Complete);
        done.title = Some("Rust in 100 Seconds".into());
        let mut state = polling("c1");
        state.phase = PollPhase::Completed;
        state.chat = Some(done);

        let rendered = status_screen(&state).render();
        assert!(rendered.starts_with(COMPLETE_HEADING));
        assert!(rendered.contains("Rust in 100 Seconds"));
        assert!(rendered.contains(COMPLETE_BODY));
    }

    #[test]
    fn test_processing_failure_and_fetch_failure_render_differently() {
        let mut processing_failed = polling("c1");
        processing_failed.phase = PollPhase::Failed;
        processing_failed.chat = Some(chat("c1", ChatStatus::Failed));

        let mut fetch_failed = polling("c1");
        fetch_failed.phase = PollPhase::FetchFailed;
        fetch_failed.last_error = Some(PollError::RetriesExhausted {
            attempts: 3,
            kind: FetchErrorKind::Network,
            message: "refused".into(),
        });

        let a = status_screen(&processing_failed).render();
        let b = status_screen(&fetch_failed).render();

        assert!(a.contains(PROCESSING_FAILED));
        assert!(!a.contains(FETCH_STATUS_FAILED));
        assert!(b.contains(FETCH_STATUS_FAILED));
        assert!(b.contains(CONNECTIVITY));
        assert!(!b.contains(PROCESSING_FAILED));
        assert_ne!(a, b);
    }

    #[test]
    fn test_fetch_failure_after_progress_shows_error() {
        let mut state = polling("c1");
        state.phase = PollPhase::FetchFailed;
        state.chat = Some(chat("c1", ChatStatus::Processing));
        assert!(matches!(status_screen(&state), StatusScreen::FetchFailed { .. }));
    }
}
