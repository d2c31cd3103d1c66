//! Cancellation and deadline context for remote calls
//!
//! Every [`ZoneApi`](crate::traits::ZoneApi) method receives a
//! [`RequestContext`]. The context races the request against its
//! cancellation token and optional deadline, so a pass can be bounded as a
//! whole regardless of the per-request client timeout.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied cancellation token and deadline
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context with no deadline and a fresh cancellation token
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_at(Instant::now() + timeout)
    }

    /// Set the deadline
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Token that cancels every call made with this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel all in-flight and future calls made with this context
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check the context without running anything
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = expired => Err(Error::DeadlineExceeded),
            result = fut => result,
        }
    }
}
