//! Error types returned by the client facade, and the HTTP status
//! classifier the executor consults to decide retry vs give-up.

use mycelian_core::{IsIrrecoverable, JobError};
use mycelian_executor::SubmitError;

/// A non-2xx (or transport-level) failure surfaced by a backend call.
///
/// This is the type [`crate::facade`] jobs wrap into [`JobError::Failed`];
/// [`HttpStatusClassifier`] downcasts `err` back to it to read the status
/// code.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HttpJobError {
    /// HTTP status code, when the failure was a parsed response rather than
    /// a transport error (DNS, connect, timeout).
    pub status: Option<u16>,
    /// Response body (if any) or the transport error's `Display`.
    pub message: String,
}

/// Failure surfaced by the client facade.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend responded with a non-2xx status.
    #[error("backend request failed: {0}")]
    Http(#[from] HttpJobError),

    /// The HTTP request could not be sent or its response could not be
    /// read/decoded (DNS, connect, timeout, malformed body).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// `memory_id` or another path segment could not be joined onto the
    /// configured backend URL.
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// The shard a write was queued on stayed full for the configured
    /// enqueue timeout. Re-exports [`SubmitError::QueueFull`] as the public
    /// backpressure sentinel callers are expected to detect and back off on.
    #[error("backpressure: shard {shard} queue full ({length}/{capacity})")]
    BackPressure {
        /// Shard the write's memory id hashed to.
        shard: u16,
        /// Observed queue length at the moment the timeout fired.
        length: usize,
        /// Shard queue capacity.
        capacity: usize,
    },

    /// The client has been closed; no further writes are accepted.
    #[error("client is closed")]
    Closed,

    /// The write's internal cancellation fired before it could be queued.
    #[error("write cancelled before enqueue")]
    Cancelled,

    /// `MemoryClient::from_env` could not load its configuration.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The `SQ_*` environment variables configuring the internal executor
    /// could not be loaded.
    #[error("executor configuration error: {0}")]
    ExecutorConfig(#[from] mycelian_executor::ConfigError),
}

impl From<SubmitError> for ClientError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::QueueFull { shard, length, capacity } => {
                ClientError::BackPressure { shard, length, capacity }
            }
            SubmitError::Closed => ClientError::Closed,
            SubmitError::Cancelled => ClientError::Cancelled,
        }
    }
}

/// Reference [`IsIrrecoverable`] classification for HTTP-backed jobs: 4xx
/// other than 408 (timeout) and 429 (rate limit) are irrecoverable;
/// everything else — 5xx, network errors, 408, 429 — is retried.
///
/// This lives here, not in `mycelian-executor`, because the executor only
/// ever consumes an injected `IsIrrecoverable` object — it has no notion of
/// HTTP at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpStatusClassifier;

impl IsIrrecoverable for HttpStatusClassifier {
    fn is_irrecoverable(&self, err: &JobError) -> bool {
        match err {
            JobError::Nil | JobError::Cancelled => true,
            JobError::Failed(inner) => match inner.downcast_ref::<ClientError>() {
                Some(ClientError::Http(HttpJobError { status: Some(code), .. })) => {
                    is_non_retryable_status(*code)
                }
                _ => false,
            },
        }
    }
}

fn is_non_retryable_status(code: u16) -> bool {
    (400..500).contains(&code) && code != 408 && code != 429
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(status: Option<u16>) -> JobError {
        JobError::failed(ClientError::Http(HttpJobError {
            status,
            message: "boom".to_string(),
        }))
    }

    #[test]
    fn four_oh_four_is_irrecoverable() {
        assert!(HttpStatusClassifier.is_irrecoverable(&failed(Some(404))));
    }

    #[test]
    fn four_oh_eight_and_four_two_nine_are_recoverable() {
        assert!(!HttpStatusClassifier.is_irrecoverable(&failed(Some(408))));
        assert!(!HttpStatusClassifier.is_irrecoverable(&failed(Some(429))));
    }

    #[test]
    fn five_xx_is_recoverable() {
        assert!(!HttpStatusClassifier.is_irrecoverable(&failed(Some(503))));
    }

    #[test]
    fn transport_error_with_no_status_is_recoverable() {
        assert!(!HttpStatusClassifier.is_irrecoverable(&failed(None)));
    }

    #[test]
    fn nil_and_cancelled_are_irrecoverable() {
        assert!(HttpStatusClassifier.is_irrecoverable(&JobError::Nil));
        assert!(HttpStatusClassifier.is_irrecoverable(&JobError::Cancelled));
    }
}
