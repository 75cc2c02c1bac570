//! Bridges the worker pool to the pipeline.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use briefcheck_protocol::{CancellationToken, EngineError, JobId, JobPayload, SnapshotSlot};
use briefcheck_worker::JobHandler;
use tracing::debug;

use crate::pipeline::Pipeline;

/// Resolves every queued job to the one handler there is: the pipeline.
pub struct PipelineHandler {
    pipeline: Arc<Pipeline>,
}

impl PipelineHandler {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl JobHandler for PipelineHandler {
    async fn run(
        &self,
        job_id: &JobId,
        payload: JobPayload,
        cancel: CancellationToken,
        snapshot: SnapshotSlot,
    ) -> Result<()> {
        match self
            .pipeline
            .run_to_completion(job_id, &payload.text, &cancel, &snapshot)
            .await
        {
            Ok(_) => Ok(()),
            // The pipeline already recorded the terminal failure; the worker
            // only needs to acknowledge the queue entry.
            Err(EngineError::Transport(message)) => Err(anyhow::anyhow!(message)),
            Err(error) => {
                debug!(job_id = %job_id, error = %error, "job failed in pipeline");
                Ok(())
            }
        }
    }
}
