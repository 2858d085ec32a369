// src/poller.rs
//! Chat status polling.
//!
//! A [`StatusPoller`] fetches a chat until the backend reports a terminal
//! status. Each poll retries transient failures a bounded number of times;
//! the next poll starts one interval after the previous one finished, so two
//! fetches for the same chat are never in flight together.
//!
//! A [`StatusView`] owns one poll task at a time and publishes its progress
//! through a `watch` channel. Every published update carries the generation
//! of the task that produced it; updates from a task the view has since
//! replaced or cancelled are dropped.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api_client::ApiError;
use crate::clock::{Clock, TokioClock};
use crate::models::chat::{Chat, ChatStatus};
use crate::services::ChatApi;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between the end of one poll and the start of the next.
    pub interval: Duration,
    /// Fetch attempts per poll, including the first.
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl PollConfig {
    // Constant schedule: no growth, no jitter, no overall deadline.
    fn retry_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            current_interval: self.retry_delay,
            initial_interval: self.retry_delay,
            randomization_factor: 0.0,
            multiplier: 1.0,
            max_interval: self.retry_delay,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();
        backoff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    /// No chat to poll.
    #[default]
    Idle,
    Polling,
    /// Backend reported `complete`.
    Completed,
    /// Backend reported `failed`.
    Failed,
    /// The client could not fetch the chat. Says nothing about processing.
    FetchFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request never produced a response.
    Network,
    /// The backend answered with this status code.
    Http(u16),
    /// The response body was not a chat.
    Decode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("failed to fetch chat status after {attempts} attempt(s): {message}")]
    RetriesExhausted {
        attempts: u32,
        kind: FetchErrorKind,
        message: String,
    },
    #[error("chat status request was rejected: {message}")]
    Rejected { kind: FetchErrorKind, message: String },
}

impl PollError {
    fn from_api(err: &ApiError, attempts: u32) -> Self {
        let kind = match err {
            ApiError::Transport(_) => FetchErrorKind::Network,
            ApiError::Http(http) => FetchErrorKind::Http(http.status),
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => FetchErrorKind::Decode,
        };
        let message = err.to_string();
        if err.is_transient() {
            PollError::RetriesExhausted { attempts, kind, message }
        } else {
            PollError::Rejected { kind, message }
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            PollError::RetriesExhausted { kind, .. } | PollError::Rejected { kind, .. } => *kind,
        }
    }
}

/// Snapshot of a view's polling progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollState {
    pub generation: u64,
    pub chat_id: Option<String>,
    pub phase: PollPhase,
    /// Last chat the backend returned. Never altered by the client.
    pub chat: Option<Chat>,
    pub last_error: Option<PollError>,
    /// Failed attempts within the poll currently running.
    pub retry_count: u32,
    /// Fetch attempts issued since polling started.
    pub fetch_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(Chat),
    Failed(Chat),
    FetchFailed(PollError),
    Cancelled,
}

/// Write handle for one poll task. Updates are applied only while the
/// state's generation still matches the sink's.
#[derive(Debug, Clone)]
pub struct StateSink {
    tx: Arc<watch::Sender<PollState>>,
    generation: u64,
}

impl StateSink {
    /// Sink with its own channel, for running a poller without a view.
    pub fn detached(chat_id: &str) -> Self {
        let (tx, _rx) = watch::channel(PollState {
            generation: 1,
            chat_id: Some(chat_id.to_string()),
            phase: PollPhase::Polling,
            ..Default::default()
        });
        Self {
            tx: Arc::new(tx),
            generation: 1,
        }
    }

    /// Apply `update` unless this sink is stale. Returns whether it applied.
    pub fn update<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut PollState),
    {
        let generation = self.generation;
        let applied = self.tx.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            update(state);
            true
        });
        if !applied {
            debug!(generation, "dropping stale poll update");
        }
        applied
    }

    pub fn snapshot(&self) -> PollState {
        self.tx.borrow().clone()
    }
}

pub struct StatusPoller {
    api: Arc<dyn ChatApi>,
    clock: Arc<dyn Clock>,
    config: PollConfig,
}

impl std::fmt::Debug for StatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPoller")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StatusPoller {
    pub fn new(api: Arc<dyn ChatApi>, clock: Arc<dyn Clock>, config: PollConfig) -> Self {
        Self { api, clock, config }
    }

    /// Poller on the tokio timer with the default policy.
    pub fn with_defaults(api: Arc<dyn ChatApi>) -> Self {
        Self::new(api, Arc::new(TokioClock), PollConfig::default())
    }

    /// One poll: fetch the chat, retrying transient failures up to the
    /// configured number of attempts.
    pub async fn fetch_with_retry(&self, chat_id: &str, sink: &StateSink) -> Result<Chat, PollError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.retry_backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            sink.update(|state| state.fetch_count += 1);

            let err = match self.api.get_chat_by_id(chat_id).await {
                Ok(chat) => return Ok(chat),
                Err(err) => err,
            };
            sink.update(|state| state.retry_count = attempt);

            if !err.is_transient() {
                warn!(chat_id, attempt, error = %err, "chat status fetch rejected");
                return Err(PollError::from_api(&err, attempt));
            }
            if attempt >= max_attempts {
                warn!(chat_id, attempt, error = %err, "chat status fetch failed, giving up");
                return Err(PollError::from_api(&err, attempt));
            }

            let delay = backoff.next_backoff().unwrap_or(self.config.retry_delay);
            warn!(chat_id, attempt, ?delay, error = %err, "chat status fetch failed, retrying");
            self.clock.sleep(delay).await;
        }
    }

    /// Poll `chat_id` until it reaches a terminal state, a poll fails, or
    /// `cancel` fires. Progress goes to `sink`.
    pub async fn run(&self, chat_id: &str, sink: &StateSink, cancel: &CancellationToken) -> PollOutcome {
        info!(chat_id, interval_ms = self.config.interval.as_millis() as u64, "polling chat status");

        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(chat_id),
                result = self.fetch_with_retry(chat_id, sink) => result,
            };

            let chat = match fetched {
                Ok(chat) => chat,
                Err(err) => {
                    sink.update(|state| {
                        state.phase = PollPhase::FetchFailed;
                        state.last_error = Some(err.clone());
                    });
                    return PollOutcome::FetchFailed(err);
                }
            };

            let status = chat.status;
            debug!(chat_id, %status, "chat status fetched");
            sink.update(|state| {
                state.phase = match status {
                    ChatStatus::Processing => PollPhase::Polling,
                    ChatStatus::Complete => PollPhase::Completed,
                    ChatStatus::Failed => PollPhase::Failed,
                };
                state.chat = Some(chat.clone());
                state.last_error = None;
                state.retry_count = 0;
            });

            match status {
                ChatStatus::Complete => {
                    info!(chat_id, "chat processing complete");
                    return PollOutcome::Completed(chat);
                }
                ChatStatus::Failed => {
                    warn!(chat_id, "chat processing failed");
                    return PollOutcome::Failed(chat);
                }
                ChatStatus::Processing => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(chat_id),
                _ = self.clock.sleep(self.config.interval) => {}
            }
        }
    }
}

fn cancelled(chat_id: &str) -> PollOutcome {
    debug!(chat_id, "status polling cancelled");
    PollOutcome::Cancelled
}

struct ActivePoll {
    cancel: CancellationToken,
    handle: JoinHandle<PollOutcome>,
}

/// Polling state owned by one status screen.
///
/// `show` switches the chat being displayed; dropping or unmounting the view
/// stops polling. Must be used inside a tokio runtime.
pub struct StatusView {
    poller: Arc<StatusPoller>,
    state: Arc<watch::Sender<PollState>>,
    generation: u64,
    active: Option<ActivePoll>,
}

impl StatusView {
    pub fn new(poller: Arc<StatusPoller>) -> Self {
        let (tx, _rx) = watch::channel(PollState::default());
        Self {
            poller,
            state: Arc::new(tx),
            generation: 0,
            active: None,
        }
    }

    /// Display `chat_id`, or nothing when it is `None` or blank. Any poll for
    /// a previous chat is cancelled and its late results are ignored.
    pub fn show(&mut self, chat_id: Option<&str>) -> PollPhase {
        self.stop();
        self.generation += 1;
        let generation = self.generation;

        let Some(chat_id) = chat_id.map(str::trim).filter(|id| !id.is_empty()) else {
            self.state.send_replace(PollState {
                generation,
                ..Default::default()
            });
            return PollPhase::Idle;
        };

        self.state.send_replace(PollState {
            generation,
            chat_id: Some(chat_id.to_string()),
            phase: PollPhase::Polling,
            ..Default::default()
        });

        let sink = StateSink {
            tx: self.state.clone(),
            generation,
        };
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let poller = self.poller.clone();
        let chat_id = chat_id.to_string();
        let handle = tokio::spawn(async move { poller.run(&chat_id, &sink, &task_cancel).await });

        self.active = Some(ActivePoll { cancel, handle });
        PollPhase::Polling
    }

    pub fn snapshot(&self) -> PollState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    /// Wait for the current poll task to finish on its own. Dropping the
    /// returned future leaves the task owned by the view.
    pub async fn wait_until_settled(&mut self) -> Option<PollOutcome> {
        let active = self.active.as_mut()?;
        let joined = (&mut active.handle).await;
        self.active = None;
        match joined {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(error = %err, "status poll task ended abnormally");
                Some(PollOutcome::Cancelled)
            }
        }
    }

    /// Stop polling and discard anything still in flight.
    pub fn unmount(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            // Rejects late writes from the cancelled task.
            self.generation += 1;
            let generation = self.generation;
            self.state.send_modify(|state| state.generation = generation);
        }
    }
}

impl Drop for StatusView {
    fn drop(&mut self) {
        self.stop();
    }
}
