//! The abstract metrics sink the executor emits named counters/histograms
//! through. One label dimension only — the shard index — to keep
//! cardinality bounded regardless of how many distinct keys flow through it.

use std::fmt;

/// A shard index rendered as a short label for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShardLabel(pub u16);

impl fmt::Display for ShardLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metrics the sharded executor emits.
///
/// Implementations must be cheap to call on the hot path (every submit,
/// every dequeue, every job run) — no I/O, no locking beyond what the
/// concrete backend already does internally.
pub trait MetricsSink: Send + Sync {
    /// A job was accepted into a shard's buffer.
    fn submissions_total_inc(&self, shard: ShardLabel);

    /// An enqueue attempt timed out because the shard buffer was full.
    fn queue_full_total_inc(&self, shard: ShardLabel);

    /// A single `Job::run` invocation completed (success or failure) in
    /// `secs` seconds.
    fn run_duration_observe(&self, shard: ShardLabel, secs: f64);

    /// The shard buffer's current length, sampled after a dequeue or drain.
    fn queue_depth_set(&self, shard: ShardLabel, depth: u64);
}

/// A sink that discards every observation. The default when no sink is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn submissions_total_inc(&self, _shard: ShardLabel) {}
    fn queue_full_total_inc(&self, _shard: ShardLabel) {}
    fn run_duration_observe(&self, _shard: ShardLabel, _secs: f64) {}
    fn queue_depth_set(&self, _shard: ShardLabel, _depth: u64) {}
}

/// A sink that forwards to the `metrics` crate's globally installed
/// recorder (e.g. `metrics-exporter-prometheus`).
#[cfg(feature = "facade-metrics")]
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeMetricsSink;

#[cfg(feature = "facade-metrics")]
impl MetricsSink for FacadeMetricsSink {
    fn submissions_total_inc(&self, shard: ShardLabel) {
        metrics::counter!("submissions_total", "shard" => shard.to_string()).increment(1);
    }

    fn queue_full_total_inc(&self, shard: ShardLabel) {
        metrics::counter!("queue_full_total", "shard" => shard.to_string()).increment(1);
    }

    fn run_duration_observe(&self, shard: ShardLabel, secs: f64) {
        metrics::histogram!("run_duration_seconds", "shard" => shard.to_string()).record(secs);
    }

    fn queue_depth_set(&self, shard: ShardLabel, depth: u64) {
        metrics::gauge!("queue_depth", "shard" => shard.to_string()).set(depth as f64);
    }
}
