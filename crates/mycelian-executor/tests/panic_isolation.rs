use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mycelian_core::{CancellationToken, ErrorHandler, FnJob, JobError};
use mycelian_executor::{Config, Executor};

struct RecordingHandler(std::sync::Mutex<Vec<String>>);
impl ErrorHandler for RecordingHandler {
    fn on_job_error(&self, key: &str, _attempt: u32, err: &JobError) {
        self.0.lock().unwrap().push(format!("{key}: {err}"));
    }
}

/// A job panicking must not take down its worker task, and must not stop
/// other shards from making progress.
#[tokio::test]
async fn a_panicking_job_is_isolated_to_its_own_shard() {
    let handler = Arc::new(RecordingHandler(std::sync::Mutex::new(Vec::new())));
    let mut cfg = Config::new();
    cfg.shards = 4;
    cfg.max_attempts = 1;
    cfg.error_handler = handler.clone();
    let executor = Executor::new(cfg);

    let panicking = FnJob::new(|_cancel| async { panic!("boom") });
    executor.submit("mem-panics", panicking, CancellationToken::new()).await.unwrap();

    let ran_after = Arc::new(AtomicUsize::new(0));
    let ran_after2 = ran_after.clone();
    let healthy = FnJob::new(move |_cancel| {
        let ran_after = ran_after2.clone();
        async move {
            ran_after.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    // Two more jobs on the same key as the panicking one: if the worker
    // died with it, this would never run.
    executor.submit("mem-panics", healthy, CancellationToken::new()).await.unwrap();

    executor.stop().await;

    assert_eq!(ran_after.load(Ordering::SeqCst), 1);
    let reported = handler.0.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert!(reported[0].contains("panicked"), "expected panic message, got {:?}", reported[0]);
}
