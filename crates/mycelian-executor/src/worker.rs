//! The per-shard worker loop: single consumer, serial execution, retry with
//! backoff, panic isolation, and unconditional draining on shutdown.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use mycelian_core::{CancellationToken, Job, JobError, ShardLabel};
use tokio::sync::{mpsc, oneshot};

use crate::config::Config;

/// A single item flowing through a shard's buffer.
pub(crate) enum ShardMessage {
    /// A unit of work keyed by the string it was submitted under, paired
    /// with the cancellation token its submitter supplied.
    Job {
        key: Arc<str>,
        job: Box<dyn Job>,
        cancel: CancellationToken,
    },
    /// A barrier sentinel: fires `tx` once every job ahead of it in the same
    /// shard has run, giving read-after-write consistency for that key.
    Barrier(oneshot::Sender<()>),
}

/// Drives one shard's queue: normal operation races the next message
/// against the shutdown signal; once shutdown fires, the shard switches to
/// a non-blocking drain of whatever is already buffered and exits.
///
/// The executor never closes its `Sender`s (they must stay usable so
/// `submit` can return `Closed` instead of panicking), so the channel
/// itself never reaches the "closed and empty" state on its own — the
/// shutdown token, not channel closure, is what ends this loop.
pub(crate) async fn run(
    shard: u16,
    mut rx: mpsc::Receiver<ShardMessage>,
    shutdown: CancellationToken,
    cfg: Arc<Config>,
) {
    let label = ShardLabel(shard);
    loop {
        // `biased` so that once `shutdown` fires it always wins over a
        // simultaneously-ready message: every job still in the buffer at
        // that point goes through `drain`, never through the normal
        // pre-dispatch cancellation check in `handle`.
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                drain(label, &mut rx, &cfg).await;
                break;
            }
            msg = rx.recv() => {
                match msg {
                    Some(msg) => handle(label, msg, &shutdown, &cfg).await,
                    None => break,
                }
            }
        }
        cfg.metrics.queue_depth_set(label, rx.len() as u64);
    }
}

async fn handle(label: ShardLabel, msg: ShardMessage, shutdown: &CancellationToken, cfg: &Config) {
    match msg {
        ShardMessage::Barrier(tx) => {
            let _ = tx.send(());
        }
        ShardMessage::Job { key, job, cancel } => {
            if cancel.is_cancelled() {
                report_error(&key, 1, &JobError::Cancelled, cfg);
                return;
            }
            run_with_retry(label, &key, job, &cancel, shutdown, cfg).await;
        }
    }
}

/// Calls the configured `ErrorHandler`, isolating the worker loop from a
/// handler that panics the same way job execution itself is isolated.
fn report_error(key: &str, attempt: u32, err: &JobError, cfg: &Config) {
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        cfg.error_handler.on_job_error(key, attempt, err);
    }));
    if outcome.is_err() {
        tracing::error!(key, attempt, "error handler panicked");
    }
}

/// Run every already-buffered message exactly once, with no retry, even if
/// its cancellation token already fired — draining exists to guarantee
/// forward progress on shutdown, not to honor cancellation.
async fn drain(label: ShardLabel, rx: &mut mpsc::Receiver<ShardMessage>, cfg: &Config) {
    while let Ok(msg) = rx.try_recv() {
        match msg {
            ShardMessage::Barrier(tx) => {
                let _ = tx.send(());
            }
            ShardMessage::Job { key, mut job, cancel } => {
                let started = Instant::now();
                let outcome = AssertUnwindSafe(job.run(cancel)).catch_unwind().await;
                cfg.metrics.run_duration_observe(label, started.elapsed().as_secs_f64());
                let err = match outcome {
                    Ok(Ok(())) => continue,
                    Ok(Err(err)) => err,
                    Err(panic_payload) => JobError::from_panic(panic_payload),
                };
                report_error(&key, 1, &err, cfg);
            }
        }
        cfg.metrics.queue_depth_set(label, rx.len() as u64);
    }
}

async fn run_with_retry(
    shard: ShardLabel,
    key: &str,
    mut job: Box<dyn Job>,
    cancel: &CancellationToken,
    shutdown: &CancellationToken,
    cfg: &Config,
) {
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let started = Instant::now();
        let err = match AssertUnwindSafe(job.run(cancel.clone())).catch_unwind().await {
            Ok(Ok(())) => {
                cfg.metrics.run_duration_observe(shard, started.elapsed().as_secs_f64());
                return;
            }
            Ok(Err(err)) => err,
            Err(panic_payload) => JobError::from_panic(panic_payload),
        };
        cfg.metrics.run_duration_observe(shard, started.elapsed().as_secs_f64());

        let irrecoverable = cfg.is_irrecoverable.is_irrecoverable(&err);
        let exhausted = attempt >= cfg.max_attempts;

        if irrecoverable || exhausted {
            report_error(key, attempt, &err, cfg);
            return;
        }

        let delay = backoff_for_attempt(attempt, cfg.base_backoff, cfg.max_interval);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.cancelled() => {
                report_error(key, attempt, &err, cfg);
                return;
            }
            _ = cancel.cancelled() => {
                report_error(key, attempt, &err, cfg);
                return;
            }
        }
    }
}

/// `base * 2^(attempt - 1)`, capped at `max`. No jitter: a deterministic
/// backoff keeps retry timing exact for anything timing-sensitive watching
/// it, and spec calls for doubling, not randomized, delay by default.
fn backoff_for_attempt(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31) as f64;
    let secs = (base.as_secs_f64() * 2f64.powf(exponent)).min(max.as_secs_f64());
    Duration::from_secs_f64(secs.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_each_attempt_until_capped() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(20);
        assert_eq!(backoff_for_attempt(1, base, max), Duration::from_millis(100));
        assert_eq!(backoff_for_attempt(2, base, max), Duration::from_millis(200));
        assert_eq!(backoff_for_attempt(3, base, max), Duration::from_millis(400));
        assert_eq!(backoff_for_attempt(20, base, max), max);
    }
}
