//! The sharded executor: hash-partitioned submission onto `N` single-consumer
//! worker lanes.

use std::sync::Arc;

use mycelian_core::{shard_for_key, CancellationToken, Job, MetricsSink, ShardLabel};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::SubmitError;
use crate::worker::{self, ShardMessage};

/// Hash-partitioned FIFO execution engine.
///
/// Cloning an `Executor` is not supported; wrap it in `Arc` if multiple
/// facade handles need to share one. `stop` is idempotent and safe to call
/// from any of those handles.
pub struct Executor {
    senders: Vec<mpsc::Sender<ShardMessage>>,
    shards: u16,
    queue_size: usize,
    enqueue_timeout: std::time::Duration,
    shutdown: CancellationToken,
    workers: Mutex<Option<JoinSet<()>>>,
    metrics: Arc<dyn MetricsSink>,
}

impl Executor {
    /// Build the executor and spawn one worker task per shard.
    pub fn new(cfg: Config) -> Self {
        let cfg = cfg.normalized();
        let shards = cfg.shards;
        let queue_size = cfg.queue_size;
        let enqueue_timeout = cfg.enqueue_timeout;
        let shutdown = CancellationToken::new();
        let cfg = Arc::new(cfg);
        let metrics = cfg.metrics.clone();

        let mut senders = Vec::with_capacity(shards as usize);
        let mut workers = JoinSet::new();
        for shard in 0..shards {
            let (tx, rx) = mpsc::channel(queue_size);
            senders.push(tx);
            let shutdown = shutdown.clone();
            let cfg = cfg.clone();
            workers.spawn(async move {
                worker::run(shard, rx, shutdown, cfg).await;
            });
        }

        Executor {
            senders,
            shards,
            queue_size,
            enqueue_timeout,
            shutdown,
            workers: Mutex::new(Some(workers)),
            metrics,
        }
    }

    /// Number of shard lanes this executor was built with.
    pub fn shard_count(&self) -> u16 {
        self.shards
    }

    /// `true` once [`Executor::stop`] has been called.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Hand `job` to the shard `key` hashes to.
    ///
    /// Races enqueue success against the executor's own shutdown, `cancel`
    /// firing, and the configured enqueue timeout. Returns as soon as the
    /// job is buffered — it does not wait for the job to run.
    pub async fn submit<J>(&self, key: &str, job: J, cancel: CancellationToken) -> Result<(), SubmitError>
    where
        J: Job,
    {
        let shard = shard_for_key(key, self.shards);
        let msg = ShardMessage::Job {
            key: Arc::from(key),
            job: Box::new(job),
            cancel: cancel.clone(),
        };
        self.enqueue(shard, msg, cancel).await
    }

    /// Submit a barrier for `key` and wait for every job ahead of it on the
    /// same shard to finish running. Gives read-after-write consistency
    /// without the caller needing to know which shard `key` landed on.
    pub async fn barrier(&self, key: &str, cancel: CancellationToken) -> Result<(), SubmitError> {
        let shard = shard_for_key(key, self.shards);
        let (tx, rx) = oneshot::channel();
        self.enqueue(shard, ShardMessage::Barrier(tx), cancel.clone()).await?;

        tokio::select! {
            res = rx => res.map_err(|_| SubmitError::Closed),
            _ = cancel.cancelled() => Err(SubmitError::Cancelled),
        }
    }

    async fn enqueue(&self, shard: u16, msg: ShardMessage, cancel: CancellationToken) -> Result<(), SubmitError> {
        if self.shutdown.is_cancelled() {
            return Err(SubmitError::Closed);
        }
        if cancel.is_cancelled() {
            return Err(SubmitError::Cancelled);
        }
        let sender = &self.senders[shard as usize];

        let label = ShardLabel(shard);
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(SubmitError::Closed),
            _ = cancel.cancelled() => Err(SubmitError::Cancelled),
            res = sender.send(msg) => {
                res.map_err(|_| SubmitError::Closed).inspect(|()| self.metrics.submissions_total_inc(label))
            }
            _ = tokio::time::sleep(self.enqueue_timeout) => {
                let length = self.queue_size - sender.capacity();
                self.metrics.queue_full_total_inc(label);
                Err(SubmitError::QueueFull {
                    shard,
                    length,
                    capacity: self.queue_size,
                })
            }
        }
    }

    /// Signal shutdown and wait for every shard to drain its buffered jobs.
    ///
    /// Idempotent: a second call observes the worker set already taken and
    /// returns immediately.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        let mut guard = self.workers.lock().await;
        if let Some(mut set) = guard.take() {
            while let Some(res) = set.join_next().await {
                if let Err(err) = res {
                    tracing::warn!(error = %err, "shard worker task panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mycelian_core::FnJob;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn submit_then_stop_runs_the_job() {
        let executor = Executor::new(Config::new());
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = ran.clone();
        let job = FnJob::new(move |_cancel| {
            let ran = ran2.clone();
            async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        executor.submit("key-a", job, CancellationToken::new()).await.unwrap();
        executor.stop().await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn barrier_waits_for_prior_jobs_on_same_shard() {
        let executor = Executor::new(Config::new());
        let order = Arc::new(Mutex::new(Vec::<&'static str>::new()));

        let order2 = order.clone();
        let job = FnJob::new(move |_cancel| {
            let order = order2.clone();
            async move {
                order.lock().await.push("job");
                Ok(())
            }
        });
        executor.submit("same-key", job, CancellationToken::new()).await.unwrap();
        executor.barrier("same-key", CancellationToken::new()).await.unwrap();
        order.lock().await.push("after-barrier");

        assert_eq!(*order.lock().await, vec!["job", "after-barrier"]);
        executor.stop().await;
    }

    #[tokio::test]
    async fn submit_after_stop_is_rejected() {
        let executor = Executor::new(Config::new());
        executor.stop().await;
        let err = executor
            .submit("key", FnJob::nil(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Closed));
    }

    #[tokio::test]
    async fn caller_cancellation_aborts_enqueue() {
        let mut cfg = Config::new();
        cfg.shards = 1;
        cfg.queue_size = 1;
        let executor = Executor::new(cfg);

        // Fill the single slot so the next enqueue has to wait.
        executor
            .submit("k", FnJob::new(|_| async { Ok(()) }), CancellationToken::new())
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = executor
            .submit("k", FnJob::nil(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Cancelled));
        executor.stop().await;
    }

    #[tokio::test]
    async fn queue_full_times_out_when_buffer_stays_saturated() {
        let mut cfg = Config::new();
        cfg.shards = 1;
        cfg.queue_size = 1;
        cfg.enqueue_timeout = Duration::from_millis(20);
        let executor = Executor::new(cfg);

        let (release_tx, release_rx) = oneshot::channel::<()>();
        let mut release_rx = Some(release_rx);
        let blocking = FnJob::new(move |_cancel| {
            let rx = release_rx.take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(())
            }
        });
        executor.submit("k", blocking, CancellationToken::new()).await.unwrap();

        // Shard is now busy running `blocking`; the buffer behind it fills.
        executor
            .submit("k", FnJob::new(|_| async { Ok(()) }), CancellationToken::new())
            .await
            .unwrap();

        let err = executor
            .submit("k", FnJob::nil(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::QueueFull { .. }));

        let _ = release_tx.send(());
        executor.stop().await;
    }

    #[derive(Default)]
    struct RecordingSink {
        submissions: std::sync::atomic::AtomicUsize,
        queue_full: std::sync::atomic::AtomicUsize,
    }

    impl mycelian_core::MetricsSink for RecordingSink {
        fn submissions_total_inc(&self, _shard: mycelian_core::ShardLabel) {
            self.submissions.fetch_add(1, Ordering::SeqCst);
        }
        fn queue_full_total_inc(&self, _shard: mycelian_core::ShardLabel) {
            self.queue_full.fetch_add(1, Ordering::SeqCst);
        }
        fn run_duration_observe(&self, _shard: mycelian_core::ShardLabel, _secs: f64) {}
        fn queue_depth_set(&self, _shard: mycelian_core::ShardLabel, _depth: u64) {}
    }

    #[tokio::test]
    async fn successful_submit_increments_submissions_total() {
        let sink = Arc::new(RecordingSink::default());
        let mut cfg = Config::new();
        cfg.metrics = sink.clone();
        let executor = Executor::new(cfg);

        executor
            .submit("key", FnJob::new(|_| async { Ok(()) }), CancellationToken::new())
            .await
            .unwrap();
        executor.stop().await;

        assert_eq!(sink.submissions.load(Ordering::SeqCst), 1);
        assert_eq!(sink.queue_full.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn queue_full_increments_queue_full_total() {
        let sink = Arc::new(RecordingSink::default());
        let mut cfg = Config::new();
        cfg.shards = 1;
        cfg.queue_size = 1;
        cfg.enqueue_timeout = Duration::from_millis(20);
        cfg.metrics = sink.clone();
        let executor = Executor::new(cfg);

        let (release_tx, release_rx) = oneshot::channel::<()>();
        let mut release_rx = Some(release_rx);
        let blocking = FnJob::new(move |_cancel| {
            let rx = release_rx.take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(())
            }
        });
        executor.submit("k", blocking, CancellationToken::new()).await.unwrap();
        executor
            .submit("k", FnJob::new(|_| async { Ok(()) }), CancellationToken::new())
            .await
            .unwrap();

        let err = executor
            .submit("k", FnJob::nil(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::QueueFull { .. }));
        assert_eq!(sink.queue_full.load(Ordering::SeqCst), 1);

        let _ = release_tx.send(());
        executor.stop().await;
    }
}
