//! Wire DTOs for the memory service's HTTP API.
//!
//! These are the "resource-specific request assembly and response parsing"
//! collaborators the scheduling core treats as external: the executor and
//! worker never see these types, only the `Result<(), JobError>` a job
//! closure built around them returns.

use serde::{Deserialize, Serialize};

/// A new entry to append to a memory's timeline.
#[derive(Debug, Clone, Serialize)]
pub struct NewEntry {
    /// Speaker role, e.g. `"user"` or `"assistant"`.
    pub role: String,
    /// Entry body.
    pub content: String,
    /// Opaque caller-supplied metadata, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// An entry as returned by a read call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Backend-assigned entry identifier.
    pub entry_id: String,
    /// Memory this entry belongs to.
    pub memory_id: String,
    /// Speaker role.
    pub role: String,
    /// Entry body.
    pub content: String,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

/// A new context snapshot to store for a memory.
#[derive(Debug, Clone, Serialize)]
pub struct NewContextSnapshot {
    /// Summary text the snapshot captures.
    pub summary: String,
    /// Opaque caller-supplied metadata, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// A context snapshot as returned by a read call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Memory this snapshot belongs to.
    pub memory_id: String,
    /// Summary text.
    pub summary: String,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

/// A search request against a memory's entries.
#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    /// Free-text query.
    pub query: String,
    /// Maximum number of hits to return.
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

fn default_search_limit() -> u32 {
    10
}

impl SearchQuery {
    /// Build a query with the default hit limit.
    pub fn new(query: impl Into<String>) -> Self {
        SearchQuery {
            query: query.into(),
            limit: default_search_limit(),
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matched entry identifier.
    pub entry_id: String,
    /// Memory the matched entry belongs to.
    pub memory_id: String,
    /// Relevance score; higher is more relevant. Backend-defined scale.
    pub score: f32,
    /// Matched entry body.
    pub content: String,
}

/// An embedded prompt template fetched by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Template name.
    pub name: String,
    /// Template body, with backend-defined placeholder syntax.
    pub template: String,
    /// Monotonically increasing template version.
    pub version: u32,
}

/// Outcome of a successful enqueue: acceptance onto the shard buffer, not
/// backend completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueAck {
    /// The memory id the write was keyed (and shard-hashed) by.
    pub stream_id: String,
    /// Always [`AckStatus::Enqueued`]; a write that didn't enqueue returns
    /// `Err` instead of an ack with a different status.
    pub status: AckStatus,
}

/// Status carried by an [`EnqueueAck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// The write was accepted onto its shard buffer.
    Enqueued,
}
