//! Caller-controlled deadlines and cancellation for health probes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DataError;

/// Reusable liveness probe. Every call is an independent round-trip to the
/// store; the probe holds no state of its own.
pub type HealthCheck =
    Arc<dyn Fn(ProbeContext) -> BoxFuture<'static, Result<(), DataError>> + Send + Sync>;

/// Deadline plus cancellation token handed to a probe by its caller.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl ProbeContext {
    /// No deadline, never cancelled unless `cancel` is called.
    pub fn background() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: CancellationToken::new(),
        }
    }

    /// Derive a context that is cancelled with this one and whose deadline is
    /// the earlier of the parent's and `now + timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is already done, if it is.
    pub fn err(&self) -> Option<DataError> {
        if self.token.is_cancelled() {
            return Some(DataError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DataError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Drive `fut` until it completes, the deadline passes, or the token is
    /// cancelled. A context that is already done never polls `fut`.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, DataError>
    where
        F: Future<Output = Result<T, DataError>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(DataError::Canceled),
            _ = deadline => Err(DataError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

impl Default for ProbeContext {
    fn default() -> Self {
        Self::background()
    }
}
