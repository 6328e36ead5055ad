//! Poll scheduler.
//!
//! Holds at most one pending deadline. [`PollScheduler::arm`] always
//! replaces whatever was pending, so there is never more than one active
//! timer and re-arming can never produce duplicate concurrent polls.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::Sleep;

/// Single-timer scheduler for the recurring synchronization pass.
#[derive(Debug)]
pub struct PollScheduler {
    interval: Duration,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl PollScheduler {
    /// A disarmed scheduler firing `interval` after each [`arm`](Self::arm).
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Configured interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Start a fresh countdown, cancelling any pending one.
    pub fn arm(&mut self) {
        self.deadline = Some(Box::pin(tokio::time::sleep(self.interval)));
    }

    /// Drop the pending countdown, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a countdown is pending.
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve when the pending countdown elapses, disarming the scheduler.
    /// Never resolves while disarmed.
    ///
    /// Cancel-safe: dropping this future leaves the countdown in place.
    pub async fn fired(&mut self) {
        match self.deadline.as_mut() {
            Some(deadline) => {
                deadline.as_mut().await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
