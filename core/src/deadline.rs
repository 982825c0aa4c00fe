//! Request deadlines.
//!
//! Every call into a persistence collaborator is bounded by the deadline of
//! the request that caused it. Dropping the returned future cancels the call.

use crate::error::{DomainError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// The instant by which a request must finish, if any.
///
/// # Examples
///
/// ```
/// use ocall_core::Deadline;
/// use std::time::Duration;
///
/// let unbounded = Deadline::none();
/// assert!(unbounded.remaining().is_none());
///
/// let soon = Deadline::after(Duration::from_secs(5));
/// assert!(soon.remaining().is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No deadline: calls may run until they complete.
    #[must_use]
    pub const fn none() -> Self {
        Self { at: None }
    }

    /// A deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
        }
    }

    /// A deadline at a fixed instant.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    /// The instant of this deadline, if bounded.
    #[must_use]
    pub const fn instant(&self) -> Option<Instant> {
        self.at
    }

    /// Time left before the deadline; `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has already passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| at <= Instant::now())
    }

    /// The earlier of this deadline and `budget` from now.
    #[must_use]
    pub fn capped(&self, budget: Duration) -> Self {
        let cap = Self::after(budget);
        match (self.at, cap.at) {
            (Some(mine), Some(theirs)) => Self::at(mine.min(theirs)),
            (Some(mine), None) => Self::at(mine),
            (None, _) => cap,
        }
    }

    /// Run `operation` under this deadline.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DeadlineExceeded`] if the deadline elapses
    /// first, otherwise whatever `operation` returns.
    pub async fn run<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.at {
            None => operation.await,
            Some(at) => tokio::time::timeout_at(at, operation)
                .await
                .map_err(|_| DomainError::DeadlineExceeded)?,
        }
    }
}
