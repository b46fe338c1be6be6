//! Single-slot run controller: starting a run aborts the one before it.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::task::{AbortHandle, JoinHandle};

/// How a triggered run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    Finished(T),
    /// Superseded by a newer trigger, or cancelled explicitly.
    Cancelled,
    /// The run task panicked.
    Failed(String),
}

/// Handle to a triggered run.
pub struct RunHandle<T> {
    join: JoinHandle<T>,
}

impl<T> RunHandle<T> {
    /// Wait for the run to end.
    pub async fn outcome(self) -> RunOutcome<T> {
        match self.join.await {
            Ok(value) => RunOutcome::Finished(value),
            Err(e) if e.is_cancelled() => RunOutcome::Cancelled,
            Err(e) => RunOutcome::Failed(e.to_string()),
        }
    }
}

/// Keeps at most one pipeline run in flight.
///
/// Aborting a run drops its future, which drops any branch `JoinSet` it
/// owns and so aborts the branch tasks too.
#[derive(Default)]
pub struct RunController {
    current: Mutex<Option<AbortHandle>>,
}

impl RunController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `run`, aborting whatever run this controller started last.
    pub fn trigger<F>(&self, run: F) -> RunHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let join = tokio::spawn(run);
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(join.abort_handle());
        if let Some(previous) = previous {
            if !previous.is_finished() {
                tracing::info!("cancelling in-flight run for new trigger");
            }
            previous.abort();
        }
        RunHandle { join }
    }

    /// Abort the current run, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
