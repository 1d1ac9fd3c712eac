//! Shared cancellation and first-error bookkeeping for one pipeline run.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::{Error, Result};
use crate::telemetry;

/// State every fetch task of one run shares.
///
/// The token is a child of the caller's token: a failing page cancels its
/// siblings without cancelling the caller.
pub(crate) struct RunScope {
    token: CancellationToken,
    deadline: Option<Duration>,
    expired: AtomicBool,
    first_error: OnceLock<Error>,
}

impl RunScope {
    pub(crate) fn new(token: CancellationToken, deadline: Option<Duration>) -> Self {
        Self {
            token,
            deadline,
            expired: AtomicBool::new(false),
            first_error: OnceLock::new(),
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The error a task reports when it observes cancellation.
    pub(crate) fn cancellation_error(&self) -> Error {
        if self.expired.load(Ordering::Acquire) {
            Error::deadline(self.deadline.map_or(0, millis))
        } else {
            Error::Cancelled
        }
    }

    /// Mark the deadline as elapsed and stop every task.
    pub(crate) fn expire(&self) {
        self.expired.store(true, Ordering::Release);
        self.token.cancel();
    }

    /// Record an error. The first one wins and cancels the group; later
    /// ones are dropped.
    pub(crate) fn fail(&self, error: Error) {
        match self.first_error.set(error) {
            Ok(()) => {
                if let Some(error) = self.first_error.get() {
                    warn!(error = %error, kind = error.kind(), "Pipeline failed, stopping fetch tasks");
                    telemetry::error_recorded(error);
                }
                self.token.cancel();
            }
            Err(discarded) => {
                debug!(error = %discarded, "Discarding error reported after the first");
            }
        }
    }

    pub(crate) fn first_error(&self) -> Option<Error> {
        self.first_error.get().cloned()
    }

    /// Run `fut` unless the scope is cancelled first.
    ///
    /// Cancellation is checked before `fut` is polled, so an already
    /// cancelled scope never starts new work.
    pub(crate) async fn guard<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(self.cancellation_error()),
            result = fut => result,
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
