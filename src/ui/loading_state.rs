// src/ui/loading_state.rs
// Progress card shown while a video is being processed.

use std::fmt::Write as _;

use crate::ui::messages::PROCESSING_FAILED;

pub const CARD_TITLE: &str = "Processing Video";
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingState {
    pub status: DisplayStatus,
    pub current_step: u32,
    pub total_steps: u32,
    pub message: Option<String>,
}

impl LoadingState {
    pub fn new(status: DisplayStatus) -> Self {
        Self {
            status,
            current_step: 1,
            total_steps: 3,
            message: None,
        }
    }

    pub fn with_step(mut self, current_step: u32, total_steps: u32) -> Self {
        self.current_step = current_step;
        self.total_steps = total_steps;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn step_message(&self) -> &str {
        if let Some(message) = &self.message {
            return message;
        }
        match self.current_step {
            1 => "Fetching transcript...",
            2 => "Analyzing content...",
            3 => "Generating summary...",
            _ => "Processing...",
        }
    }

    pub fn status_message(&self) -> String {
        match (self.status, &self.message) {
            (DisplayStatus::Failed, Some(message)) => message.clone(),
            (DisplayStatus::Failed, None) => PROCESSING_FAILED.to_string(),
            (DisplayStatus::Pending, _) => "Starting processing...".to_string(),
            (DisplayStatus::Processing, _) => format!(
                "Step {}/{}: {}",
                self.current_step,
                self.total_steps,
                self.step_message()
            ),
            (DisplayStatus::Completed, _) => "Processing completed!".to_string(),
        }
    }

    /// The "still working" indicator is only shown while work is ongoing.
    pub fn show_animation(&self) -> bool {
        matches!(self.status, DisplayStatus::Pending | DisplayStatus::Processing)
    }

    pub fn progress_percent(&self) -> u32 {
        if self.total_steps == 0 {
            return 0;
        }
        let step = self.current_step.min(self.total_steps);
        ((step as f64 / self.total_steps as f64) * 100.0).round() as u32
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{CARD_TITLE}");
        let _ = writeln!(out, "{}", self.status_message());

        let markers: String = (0..self.total_steps)
            .map(|i| if i < self.current_step { '●' } else { '○' })
            .collect();
        let _ = writeln!(out, "{markers}");

        let percent = self.progress_percent();
        let filled = BAR_WIDTH * percent as usize / 100;
        let fill = if self.status == DisplayStatus::Failed { 'x' } else { '#' };
        let _ = write!(
            out,
            "[{}{}] {percent}%",
            fill.to_string().repeat(filled),
            "-".repeat(BAR_WIDTH - filled)
        );

        if self.show_animation() {
            out.push_str(" ...");
        }
        out
    }
}
