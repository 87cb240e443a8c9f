//! Caller-supplied deadlines for engine calls.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// The deadline passed before the bounded future completed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline exceeded")]
pub struct DeadlineExceeded;

/// A point in time after which engine calls are abandoned.
///
/// Dropping the bounded future cancels the in-flight call. Work the engine
/// already applied is not undone by that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// Expire `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self::at(Instant::now() + duration)
    }

    /// Expire at `instant`.
    pub fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    /// Never expire.
    pub fn none() -> Self {
        Self { at: None }
    }

    /// The expiry instant, if any.
    pub fn instant(&self) -> Option<Instant> {
        self.at
    }

    /// Time left, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// The earlier of two deadlines.
    pub fn min(self, other: Deadline) -> Deadline {
        match (self.at, other.at) {
            (Some(a), Some(b)) => Self::at(a.min(b)),
            (Some(_), None) => self,
            (None, _) => other,
        }
    }

    /// Run `future` until it completes or the deadline passes.
    pub async fn bound<F>(&self, future: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        match self.at {
            Some(at) => tokio::time::timeout_at(at, future)
                .await
                .map_err(|_| DeadlineExceeded),
            None => Ok(future.await),
        }
    }
}
