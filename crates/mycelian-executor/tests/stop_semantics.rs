use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mycelian_core::{CancellationToken, FnJob};
use mycelian_executor::{Config, Executor, SubmitError};

#[tokio::test]
async fn stop_drains_buffered_jobs_before_returning() {
    let mut cfg = Config::new();
    cfg.shards = 2;
    let executor = Executor::new(cfg);

    let ran = Arc::new(AtomicUsize::new(0));
    for i in 0..20 {
        let ran = ran.clone();
        let job = FnJob::new(move |_cancel| {
            let ran = ran.clone();
            async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        executor.submit(&format!("key-{i}"), job, CancellationToken::new()).await.unwrap();
    }

    executor.stop().await;
    assert_eq!(ran.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn a_drained_job_runs_even_if_its_own_cancellation_already_fired() {
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

    let cancel = CancellationToken::new();
    executor.submit("key", job, cancel.clone()).await.unwrap();
    cancel.cancel();

    executor.stop().await;
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_is_idempotent_and_submit_after_stop_is_rejected() {
    let executor = Executor::new(Config::new());
    executor.stop().await;
    executor.stop().await; // must not hang or panic on a second call

    let err = executor
        .submit("key", FnJob::nil(), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Closed));
    assert!(executor.is_closed());
}
