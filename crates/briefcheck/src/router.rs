//! Submission routing: sync for small inputs, the queue for everything
//! else, with promotion when a sync run blows its wall-clock budget.

use std::sync::Arc;
use std::time::Duration;

use briefcheck_protocol::defaults::{MAX_INPUT_BYTES, SYNC_HARD_CAP_BYTES, SYNC_WALL_CLOCK_SECS};
use briefcheck_protocol::payload::{AckStatus, PollResponse, SubmitAck};
use briefcheck_protocol::{
    CancellationToken, EngineConfig, EngineError, InputKind, Job, JobId, JobPayload, RunMode,
    SnapshotSlot,
};
use briefcheck_store::{JobQueue, ProgressStore};
use tracing::{info, warn};

use crate::pipeline::Pipeline;

/// What the caller gets back from a submission.
#[derive(Debug)]
pub enum RouteOutcome {
    /// Sync path: the full result payload.
    Completed(briefcheck_protocol::ResultPayload),
    /// Async path (or promotion): poll with the job id.
    Accepted(SubmitAck),
}

pub struct Router {
    pipeline: Arc<Pipeline>,
    store: Arc<dyn ProgressStore>,
    queue: Arc<dyn JobQueue>,
    config: EngineConfig,
}

impl Router {
    pub fn new(
        pipeline: Arc<Pipeline>,
        store: Arc<dyn ProgressStore>,
        queue: Arc<dyn JobQueue>,
        config: EngineConfig,
    ) -> Self {
        Self {
            pipeline,
            store,
            queue,
            config,
        }
    }

    /// Route a new document. Creates the job record before returning.
    pub async fn submit(
        &self,
        text: String,
        input_kind: InputKind,
        force_mode: Option<RunMode>,
    ) -> Result<RouteOutcome, EngineError> {
        if text.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        if text.len() > MAX_INPUT_BYTES {
            return Err(EngineError::TooLarge {
                size: text.len(),
                max: MAX_INPUT_BYTES,
            });
        }

        let mode = self.pick_mode(&text, force_mode);
        let job = Job::new(JobId::generate(), input_kind);
        let job_id = job.id.clone();
        self.store
            .create_job(&job)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        info!(job_id = %job_id, %mode, bytes = text.len(), "job accepted");

        match mode {
            RunMode::Sync => self.run_sync(job_id, text, input_kind).await,
            RunMode::Async => {
                self.enqueue(&job_id, text, input_kind).await?;
                Ok(RouteOutcome::Accepted(SubmitAck {
                    job_id,
                    status: AckStatus::Queued,
                }))
            }
        }
    }

    /// Poll a job by id.
    pub async fn poll(&self, job_id: &JobId) -> Result<Option<PollResponse>, EngineError> {
        let job = self
            .store
            .get_job(job_id)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        Ok(job.map(|job| PollResponse {
            job_id: job.id,
            status: job.status,
            progress_pct: job.progress_pct,
            current_step: job.current_step,
            result: job.result,
            partial_result: job.partial_result,
            error: job.error,
        }))
    }

    /// Request cancellation of a running job.
    pub async fn cancel(&self, job_id: &JobId) -> Result<(), EngineError> {
        self.store
            .request_cancel(job_id)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))
    }

    /// Fixed, testable mode policy.
    fn pick_mode(&self, text: &str, force_mode: Option<RunMode>) -> RunMode {
        match force_mode {
            Some(RunMode::Sync) if text.len() <= SYNC_HARD_CAP_BYTES => RunMode::Sync,
            Some(RunMode::Async) => RunMode::Async,
            _ => {
                if text.len() < self.config.sync_threshold_bytes {
                    RunMode::Sync
                } else {
                    RunMode::Async
                }
            }
        }
    }

    async fn run_sync(
        &self,
        job_id: JobId,
        text: String,
        input_kind: InputKind,
    ) -> Result<RouteOutcome, EngineError> {
        let cancel = CancellationToken::new();
        // Sync overruns promote rather than fail, so the snapshot is only
        // a stage tracker here; the queued re-run produces the real result.
        let snapshot = SnapshotSlot::new();
        let run = self
            .pipeline
            .run_to_completion(&job_id, &text, &cancel, &snapshot);
        match tokio::time::timeout(Duration::from_secs(SYNC_WALL_CLOCK_SECS), run).await {
            Ok(Ok(payload)) => Ok(RouteOutcome::Completed(payload)),
            Ok(Err(error)) => Err(error),
            Err(_elapsed) => {
                // Too slow for the response budget: hand the job to the
                // queue and let the caller poll.
                warn!(job_id = %job_id, "sync wall clock exceeded, promoting to async");
                self.enqueue(&job_id, text, input_kind).await?;
                Ok(RouteOutcome::Accepted(SubmitAck {
                    job_id,
                    status: AckStatus::AsyncPromoted,
                }))
            }
        }
    }

    async fn enqueue(
        &self,
        job_id: &JobId,
        text: String,
        input_kind: InputKind,
    ) -> Result<(), EngineError> {
        self.queue
            .enqueue(job_id, &JobPayload { text, input_kind })
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefcheck_protocol::JobStatus;
    use briefcheck_store::MemoryStore;
    use briefcheck_verify::{MockAuthority, RateLimiter};

    fn router_with_store() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig::default();
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&store) as Arc<dyn ProgressStore>,
            Arc::new(MockAuthority::new()),
            Arc::new(RateLimiter::new(180)),
            config.clone(),
        ));
        let router = Router::new(
            pipeline,
            Arc::clone(&store) as Arc<dyn ProgressStore>,
            Arc::clone(&store) as Arc<dyn JobQueue>,
            config,
        );
        (router, store)
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let (router, _) = router_with_store();
        let err = router
            .submit(String::new(), InputKind::Text, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyInput));
    }

    #[tokio::test]
    async fn test_oversized_input_rejected() {
        let (router, _) = router_with_store();
        let huge = "x".repeat(MAX_INPUT_BYTES + 1);
        let err = router
            .submit(huge, InputKind::Text, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_small_input_runs_sync() {
        let (router, _) = router_with_store();
        let outcome = router
            .submit(
                "State v. Gamble, 168 Wn.2d 161 (2010).".to_string(),
                InputKind::Text,
                None,
            )
            .await
            .unwrap();
        match outcome {
            RouteOutcome::Completed(payload) => {
                assert_eq!(payload.stats.total_citations, 1);
            }
            RouteOutcome::Accepted(_) => panic!("expected sync completion"),
        }
    }

    #[tokio::test]
    async fn test_large_input_is_queued() {
        let (router, store) = router_with_store();
        let mut text = "Intro. ".repeat(1000); // > 5000 bytes
        text.push_str("State v. Gamble, 168 Wn.2d 161 (2010).");
        let outcome = router
            .submit(text, InputKind::Text, None)
            .await
            .unwrap();
        let ack = match outcome {
            RouteOutcome::Accepted(ack) => ack,
            RouteOutcome::Completed(_) => panic!("expected async ack"),
        };
        assert_eq!(ack.status, AckStatus::Queued);

        // The job record exists immediately for pollers.
        let job = store.get_job(&ack.job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress_pct, 0);

        // And the payload landed in the queue keyed by job id.
        let (queued_id, payload) = store.dequeue().await.unwrap().unwrap();
        assert_eq!(queued_id, ack.job_id);
        assert!(payload.text.contains("State v. Gamble"));
    }

    #[tokio::test]
    async fn test_force_sync_respects_hard_cap() {
        let (router, _) = router_with_store();
        // Above the async threshold but under the sync hard cap.
        let mut text = "Filler sentence. ".repeat(400); // ~6800 bytes
        text.push_str("State v. Gamble, 168 Wn.2d 161 (2010).");
        let outcome = router
            .submit(text, InputKind::Text, Some(RunMode::Sync))
            .await
            .unwrap();
        assert!(matches!(outcome, RouteOutcome::Completed(_)));

        // Past the hard cap the force flag is ignored.
        let giant = "x".repeat(SYNC_HARD_CAP_BYTES + 1);
        let outcome = router
            .submit(giant, InputKind::Text, Some(RunMode::Sync))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            RouteOutcome::Accepted(SubmitAck {
                status: AckStatus::Queued,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_force_async_overrides_small_input() {
        let (router, _) = router_with_store();
        let outcome = router
            .submit(
                "tiny".to_string(),
                InputKind::Text,
                Some(RunMode::Async),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, RouteOutcome::Accepted(_)));
    }

    #[tokio::test]
    async fn test_poll_unknown_job() {
        let (router, _) = router_with_store();
        assert!(router.poll(&JobId::new("missing")).await.unwrap().is_none());
    }
}
