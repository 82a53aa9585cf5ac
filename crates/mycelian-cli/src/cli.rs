//! Command-line surface: one subcommand per client facade operation.

use clap::{Parser, Subcommand};

/// Thin client for the mycelian-memory service.
///
/// Reads `MYCELIAN_BACKEND_URL`, `MYCELIAN_API_KEY`, and
/// `MYCELIAN_HTTP_TIMEOUT` from the environment; see
/// `mycelian_client::Config::from_env`.
#[derive(Debug, Parser)]
#[command(name = "mycelian", version, about = "mycelian-memory client")]
pub struct Cli {
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Facade operations exposed on the command line.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Append an entry to a memory's timeline.
    AppendEntry {
        /// Memory id to append to.
        memory_id: String,
        /// Speaker role, e.g. "user" or "assistant".
        role: String,
        /// Entry body.
        content: String,
        /// Opaque metadata as a JSON object literal.
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Store a context snapshot for a memory.
    PutContext {
        /// Memory id the snapshot belongs to.
        memory_id: String,
        /// Summary text the snapshot captures.
        summary: String,
        /// Opaque metadata as a JSON object literal.
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Delete one entry.
    DeleteEntry {
        /// Memory id the entry belongs to.
        memory_id: String,
        /// Entry id to delete.
        entry_id: String,
    },
    /// Delete a memory's context snapshot.
    DeleteContext {
        /// Memory id whose context snapshot should be deleted.
        memory_id: String,
    },
    /// List a memory's entries.
    ListEntries {
        /// Memory id to list.
        memory_id: String,
    },
    /// Fetch a memory's current context snapshot.
    GetContext {
        /// Memory id to fetch.
        memory_id: String,
    },
    /// Search a memory's entries.
    Search {
        /// Memory id to search.
        memory_id: String,
        /// Free-text query.
        query: String,
        /// Maximum number of hits to return.
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Fetch an embedded prompt template by name.
    PromptTemplate {
        /// Template name.
        name: String,
    },
    /// Block until every write queued for a memory has run.
    AwaitConsistency {
        /// Memory id to wait on.
        memory_id: String,
    },
}
