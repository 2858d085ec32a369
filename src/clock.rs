//! Sleep abstraction for the status poller.
//!
//! Production code sleeps on the tokio timer. Tests swap in [`ManualClock`],
//! which records every requested delay and advances a virtual clock instead of
//! waiting.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real time, backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: `sleep` returns after yielding once and adds the requested
/// duration to [`ManualClock::elapsed`].
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ManualClock {
    sleeps: Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "testing"))]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.sleeps.lock().unwrap().iter().sum()
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}
