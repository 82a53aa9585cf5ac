#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! The sharded FIFO execution engine: `N` independent worker lanes, each a
//! single-consumer bounded queue, fed by a hash-partitioned `submit`.
//!
//! Per-key ordering, cross-key parallelism, bounded enqueue with timeout,
//! retry with exponential backoff, a barrier primitive for read-after-write
//! consistency, and graceful draining shutdown. See the crate-level design
//! notes in the workspace `DESIGN.md` for how each piece is grounded.

mod config;
mod error;
mod executor;
mod worker;

pub use config::{Config, ConfigError};
pub use error::SubmitError;
pub use executor::Executor;
