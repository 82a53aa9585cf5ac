#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! Shared primitives for the `mycelian-memory` client SDK: the [`Job`]
//! abstraction, the shard-hash function, the [`MetricsSink`] trait, and the
//! error types every other crate in the workspace builds on.

pub mod error;
pub mod job;
pub mod metrics;
pub mod shard;

pub use error::{ErrorHandler, IsIrrecoverable, JobError, LoggingErrorHandler};
pub use job::{CancellationToken, FnJob, Job};
pub use metrics::{MetricsSink, NoopMetricsSink, ShardLabel};
pub use shard::{metrics_bucket, shard_for_key};
