//! Errors returned by [`crate::Executor::submit`] and
//! [`crate::Executor::barrier`].

/// Failure to hand a job to its shard.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The shard's buffer stayed full for the configured enqueue timeout.
    #[error("shard {shard} queue full ({length}/{capacity})")]
    QueueFull {
        /// Shard the key hashed to.
        shard: u16,
        /// Observed queue length at the moment the timeout fired.
        length: usize,
        /// Shard queue capacity.
        capacity: usize,
    },

    /// The caller-supplied cancellation token fired before the job was
    /// accepted.
    #[error("submit cancelled before enqueue")]
    Cancelled,

    /// The executor has been stopped; no further submissions are accepted.
    #[error("executor is closed")]
    Closed,
}
