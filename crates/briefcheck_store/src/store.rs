//! Store traits: per-job progress/results and the durable job queue.
//!
//! The web layer and workers share these contracts: single-writer per job
//! (the worker), multi-reader, atomic single-key writes. Queue payloads are
//! plain data keyed by job id, never callables; workers resolve the handler
//! themselves.

use async_trait::async_trait;
use briefcheck_protocol::{Job, JobId, JobPayload, ResultPayload};

use crate::error::Result;

/// Maximum requeues before a job is dead-lettered as failed.
pub const MAX_RETRY_COUNT: i32 = 3;

/// Per-job status, progress, and final result, retained for the job TTL.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn create_job(&self, job: &Job) -> Result<()>;

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>>;

    async fn exists(&self, id: &JobId) -> Result<bool>;

    /// Publish a progress update. Progress is monotonic: a percentage below
    /// the stored value is ignored. Implicitly moves `queued` jobs to
    /// `running`.
    async fn update_progress(&self, id: &JobId, pct: u8, step: &str) -> Result<()>;

    /// Terminal success; errors if the job is already terminal.
    async fn complete_job(&self, id: &JobId, result: &ResultPayload) -> Result<()>;

    /// Terminal failure; errors if the job is already terminal. A per-job
    /// timeout passes the clusters assembled so far as `partial`; every
    /// other failure passes `None` and the job carries no result data.
    async fn fail_job(
        &self,
        id: &JobId,
        error: &str,
        partial: Option<&ResultPayload>,
    ) -> Result<()>;

    async fn request_cancel(&self, id: &JobId) -> Result<()>;

    async fn cancel_requested(&self, id: &JobId) -> Result<bool>;

    /// Delete terminal jobs older than the TTL; returns how many went.
    async fn purge_expired(&self, ttl_seconds: u64) -> Result<u64>;
}

/// Durable queue delivering each job to exactly one worker.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, id: &JobId, payload: &JobPayload) -> Result<()>;

    /// Atomically claim the oldest queued job, if any.
    async fn dequeue(&self) -> Result<Option<(JobId, JobPayload)>>;

    /// Acknowledge a claimed job as done (terminal either way).
    async fn ack(&self, id: &JobId) -> Result<()>;

    /// Report a crashed job; requeues until `MAX_RETRY_COUNT`, then
    /// dead-letters it.
    async fn fail(&self, id: &JobId, error: &str) -> Result<()>;

    async fn stats(&self) -> Result<QueueStats>;
}

/// Queue roll-up counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
}
