//! Store error types.
//!
//! Store failures are fatal to the affected job: a pipeline that cannot
//! persist progress surfaces `failed` with error `transport`.

use briefcheck_protocol::{JobId, JobStatus};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("illegal status transition for job {job_id}: {from} is terminal")]
    TerminalJob { job_id: JobId, from: JobStatus },

    #[error("unsupported store URL: {0}")]
    UnsupportedUrl(String),
}
