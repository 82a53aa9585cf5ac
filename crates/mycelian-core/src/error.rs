//! Error type produced by a [`crate::Job`] run.

use std::error::Error as StdError;
use std::fmt;

/// Error surfaced by a job's `run` method.
///
/// This is the only error type the scheduling core understands. Resource
/// crates (HTTP request assembly, response parsing) construct [`JobError::Failed`]
/// around their own error types; the core never inspects the inner error
/// itself, only what an injected `IsIrrecoverable` predicate says about it.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// A nil/empty job was run. Never produced by [`crate::FnJob`] built from
    /// a real closure; only by the sentinel constructed with no closure at all.
    #[error("job is nil")]
    Nil,

    /// The caller's cancellation fired before or during the run.
    #[error("job cancelled")]
    Cancelled,

    /// The job's own logic failed. Carries the underlying error so it can be
    /// classified by an `IsIrrecoverable` predicate and logged.
    #[error("job failed: {0}")]
    Failed(#[source] Box<dyn StdError + Send + Sync>),
}

impl JobError {
    /// Wrap an arbitrary error as a job failure.
    pub fn failed<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        JobError::Failed(Box::new(err))
    }

    /// Wrap a caught panic payload as a job failure.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = panic_message(&payload);
        JobError::Failed(Box::new(PanicError(message)))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic payload with unknown type".to_string()
    }
}

#[derive(Debug)]
struct PanicError(String);

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panicked: {}", self.0)
    }
}

impl StdError for PanicError {}

/// Predicate consumed (never defined) by the worker's retry loop: does this
/// error warrant a retry, or should the job give up immediately?
///
/// The core treats this as an injected classifier so it stays reusable for
/// non-HTTP transports. The concrete HTTP-status taxonomy lives in
/// `mycelian-client`.
pub trait IsIrrecoverable: Send + Sync {
    /// Return `true` if `err` should never be retried.
    fn is_irrecoverable(&self, err: &JobError) -> bool;
}

/// Callback invoked whenever a job's error surfaces without a caller
/// waiting synchronously for it: a dropped cancellation, an irrecoverable
/// failure, or the final attempt of a recoverable one.
pub trait ErrorHandler: Send + Sync {
    /// `key` is the shard key the job was submitted under; `attempt` is
    /// 1-indexed.
    fn on_job_error(&self, key: &str, attempt: u32, err: &JobError);
}

/// Default handler: logs via `tracing::warn!` and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn on_job_error(&self, key: &str, attempt: u32, err: &JobError) {
        tracing::warn!(key, attempt, error = %err, "job error reported");
    }
}
