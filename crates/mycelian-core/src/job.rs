//! The [`Job`] abstraction: an opaque unit of work the executor schedules.

use async_trait::async_trait;

use crate::error::JobError;

/// Cancellation handle attached to a job at submit time.
///
/// A thin alias over [`tokio_util::sync::CancellationToken`], which already
/// gives us the exact semantics the scheduling core needs: a cheap-to-clone,
/// idempotent, one-shot "fired" flag that many tasks can await concurrently.
pub type CancellationToken = tokio_util::sync::CancellationToken;

/// A unit of work that the sharded executor runs.
///
/// Jobs must not assume a particular execution context: they run on whatever
/// worker task owns their shard at the time. They must treat `cancel` as
/// authoritative for abort, and must be safe to run sequentially more than
/// once (the retry loop re-invokes `run` on failure) but need not be `Sync`
/// or safe to run concurrently with itself — the executor guarantees serial
/// execution per shard.
#[async_trait]
pub trait Job: Send + 'static {
    /// Run the job once, honoring `cancel` if it fires mid-run.
    async fn run(&mut self, cancel: CancellationToken) -> Result<(), JobError>;
}

/// Type of the boxed closure an [`FnJob`] wraps.
type BoxedRun = Box<
    dyn FnMut(
            CancellationToken,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<(), JobError>> + Send>,
        > + Send,
>;

/// Adapter wrapping a plain async closure as a [`Job`].
///
/// Constructing one from `None` yields a sentinel job whose `run` always
/// returns [`JobError::Nil`] instead of panicking — callers that accidentally
/// submit a nil job get a normal error through the usual error-handler path,
/// not a crash.
pub struct FnJob {
    inner: Option<BoxedRun>,
}

impl FnJob {
    /// Wrap a closure as a job.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let mut f = f;
        let boxed: BoxedRun = Box::new(move |cancel| Box::pin(f(cancel)));
        FnJob { inner: Some(boxed) }
    }

    /// Construct the nil sentinel: running it always yields [`JobError::Nil`].
    pub fn nil() -> Self {
        FnJob { inner: None }
    }
}

#[async_trait]
impl Job for FnJob {
    async fn run(&mut self, cancel: CancellationToken) -> Result<(), JobError> {
        match &mut self.inner {
            Some(f) => f(cancel).await,
            None => Err(JobError::Nil),
        }
    }
}
