//! The public client facade: async write wrappers keyed by memory id,
//! synchronous reads that bypass the executor, and `await_consistency`.

use std::future::Future;
use std::sync::Arc;

use mycelian_core::{CancellationToken, FnJob, JobError};
use mycelian_executor::Executor;
use reqwest::Method;

use crate::config::Config;
use crate::dto::{ContextSnapshot, Entry, EnqueueAck, AckStatus, NewContextSnapshot, NewEntry, PromptTemplate, SearchHit, SearchQuery};
use crate::errors::{ClientError, HttpStatusClassifier};
use crate::http::Transport;

/// Client for the memory service.
///
/// Writes (`append_entry`, `put_context_snapshot`, the delete variants) are
/// queued on a shared [`Executor`], keyed by `memory_id`, so that writes to
/// the same memory are never reordered relative to each other even though
/// writes to different memories run fully in parallel. Reads bypass the
/// executor entirely: a read issued right after a write is not guaranteed
/// to observe it unless `await_consistency` is called first.
pub struct MemoryClient {
    transport: Transport,
    executor: Arc<Executor>,
}

impl MemoryClient {
    /// Build a client from an explicit [`Config`].
    ///
    /// The underlying executor's `SQ_*` knobs (shard count, queue size,
    /// retry budget, backoff) are loaded from the environment the same way
    /// [`mycelian_executor::Config::from_env`] does; only the HTTP-facing
    /// settings come from `config`.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.http_timeout).build()?;
        let transport = Transport::new(http, config.backend_url, config.api_key);

        let mut exec_cfg = mycelian_executor::Config::from_env()?;
        exec_cfg.is_irrecoverable = Arc::new(HttpStatusClassifier);
        let executor = Arc::new(Executor::new(exec_cfg));

        Ok(MemoryClient { transport, executor })
    }

    /// Build a client from `MYCELIAN_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(Config::from_env()?)
    }

    /// Append `entry` to `memory_id`'s timeline.
    ///
    /// Returns as soon as the write is accepted onto its shard buffer — the
    /// ack reflects queue acceptance, not backend completion. Call
    /// [`MemoryClient::await_consistency`] first if a subsequent read on
    /// this process must observe the write.
    pub async fn append_entry(
        &self,
        memory_id: &str,
        entry: NewEntry,
        cancel: CancellationToken,
    ) -> Result<EnqueueAck, ClientError> {
        let transport = self.transport.clone();
        let path = format!("memories/{memory_id}/entries");
        self.submit_write(
            memory_id,
            move |_cancel| {
                let transport = transport.clone();
                let path = path.clone();
                let entry = entry.clone();
                async move { transport.send(Method::POST, &path, &entry).await.map_err(JobError::failed) }
            },
            cancel,
        )
        .await
    }

    /// Store `snapshot` as `memory_id`'s current context.
    pub async fn put_context_snapshot(
        &self,
        memory_id: &str,
        snapshot: NewContextSnapshot,
        cancel: CancellationToken,
    ) -> Result<EnqueueAck, ClientError> {
        let transport = self.transport.clone();
        let path = format!("memories/{memory_id}/context");
        self.submit_write(
            memory_id,
            move |_cancel| {
                let transport = transport.clone();
                let path = path.clone();
                let snapshot = snapshot.clone();
                async move { transport.send(Method::PUT, &path, &snapshot).await.map_err(JobError::failed) }
            },
            cancel,
        )
        .await
    }

    /// Delete one entry, preserving write order relative to other writes on
    /// `memory_id`.
    pub async fn delete_entry(
        &self,
        memory_id: &str,
        entry_id: &str,
        cancel: CancellationToken,
    ) -> Result<EnqueueAck, ClientError> {
        let transport = self.transport.clone();
        let path = format!("memories/{memory_id}/entries/{entry_id}");
        self.submit_write(
            memory_id,
            move |_cancel| {
                let transport = transport.clone();
                let path = path.clone();
                async move { transport.delete(&path).await.map_err(JobError::failed) }
            },
            cancel,
        )
        .await
    }

    /// Delete `memory_id`'s stored context snapshot, preserving write order.
    pub async fn delete_context_snapshot(
        &self,
        memory_id: &str,
        cancel: CancellationToken,
    ) -> Result<EnqueueAck, ClientError> {
        let transport = self.transport.clone();
        let path = format!("memories/{memory_id}/context");
        self.submit_write(
            memory_id,
            move |_cancel| {
                let transport = transport.clone();
                let path = path.clone();
                async move { transport.delete(&path).await.map_err(JobError::failed) }
            },
            cancel,
        )
        .await
    }

    /// List `memory_id`'s entries. Bypasses the executor: never ordered
    /// against concurrent writes.
    pub async fn list_entries(&self, memory_id: &str) -> Result<Vec<Entry>, ClientError> {
        self.transport.get(&format!("memories/{memory_id}/entries")).await
    }

    /// Fetch `memory_id`'s current context snapshot. Bypasses the executor.
    pub async fn get_context(&self, memory_id: &str) -> Result<ContextSnapshot, ClientError> {
        self.transport.get(&format!("memories/{memory_id}/context")).await
    }

    /// Search `memory_id`'s entries. Bypasses the executor.
    pub async fn search(&self, memory_id: &str, query: SearchQuery) -> Result<Vec<SearchHit>, ClientError> {
        self.transport
            .post_json(&format!("memories/{memory_id}/search"), &query)
            .await
    }

    /// Fetch an embedded prompt template by name. Bypasses the executor.
    pub async fn get_prompt_template(&self, name: &str) -> Result<PromptTemplate, ClientError> {
        self.transport.get(&format!("prompt-templates/{name}")).await
    }

    /// Block until every write accepted for `memory_id` before this call
    /// has finished running, giving read-after-write consistency for a
    /// subsequent read on this process. Does not probe backend replication
    /// state.
    pub async fn await_consistency(&self, memory_id: &str, cancel: CancellationToken) -> Result<(), ClientError> {
        self.executor.barrier(memory_id, cancel).await.map_err(ClientError::from)
    }

    /// Stop accepting new writes and drain every already-queued one.
    /// Idempotent.
    pub async fn close(&self) {
        tracing::debug!("closing memory client, draining queued writes");
        self.executor.stop().await;
    }

    async fn submit_write<F, Fut>(&self, memory_id: &str, f: F, cancel: CancellationToken) -> Result<EnqueueAck, ClientError>
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let job = FnJob::new(f);
        self.executor.submit(memory_id, job, cancel).await?;
        Ok(EnqueueAck {
            stream_id: memory_id.to_string(),
            status: AckStatus::Enqueued,
        })
    }
}
