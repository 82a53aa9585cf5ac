#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! Public client facade for the `mycelian-memory` service: HTTP request
//! assembly for memories, entries, context snapshots, search, and prompt
//! templates; async write wrappers queued on a shared
//! [`mycelian_executor::Executor`]; synchronous reads; and
//! `await_consistency` for read-after-write.

pub mod config;
pub mod dto;

mod errors;
mod facade;
mod http;

pub use config::Config;
pub use dto::{
    AckStatus, ContextSnapshot, Entry, EnqueueAck, NewContextSnapshot, NewEntry, PromptTemplate, SearchHit,
    SearchQuery,
};
pub use errors::{ClientError, HttpJobError, HttpStatusClassifier};
pub use facade::MemoryClient;
pub use mycelian_core::CancellationToken;
