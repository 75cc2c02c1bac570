//! Worker node.
//!
//! Design principles:
//! - One worker runs one job at a time, the full pipeline in isolation
//! - The queue delivers each job to exactly one worker (atomic claim)
//! - Handler failures fail the job, never the worker
//! - Cancellation is polled from the store and relayed through a token

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use briefcheck_protocol::defaults::JOB_TIMEOUT_SECS;
use briefcheck_protocol::{CancellationToken, JobId, JobPayload, ResultPayload, SnapshotSlot};
use briefcheck_store::{JobQueue, ProgressStore};
use tracing::{error, info, warn};

/// Dispatch backoff base (ms) when the queue is empty.
const BACKOFF_BASE_MS: u64 = 50;
/// Dispatch backoff max (ms).
const BACKOFF_MAX_MS: u64 = 1_000;
/// How often a running job's cancel flag is polled (ms).
const CANCEL_POLL_MS: u64 = 500;

/// Executes one claimed job end to end. The handler publishes its own
/// progress and terminal status to the progress store; the worker wraps it
/// with claiming, timeout, cancellation relay, and queue acknowledgement.
/// The handler records stage snapshots into `snapshot` so a timed-out job
/// can still surface whatever clusters it had assembled.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn run(
        &self,
        job_id: &JobId,
        payload: JobPayload,
        cancel: CancellationToken,
        snapshot: SnapshotSlot,
    ) -> Result<()>;
}

/// Worker configuration (plain data).
#[derive(Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub job_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!(
                "worker-{}",
                uuid::Uuid::new_v4()
                    .to_string()
                    .split('-')
                    .next()
                    .unwrap_or("0")
                    .to_string()
            ),
            job_timeout: Duration::from_secs(JOB_TIMEOUT_SECS),
        }
    }
}

pub struct Worker {
    config: WorkerConfig,
    store: Arc<dyn ProgressStore>,
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn ProgressStore>,
        queue: Arc<dyn JobQueue>,
        handler: Arc<dyn JobHandler>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            store,
            queue,
            handler,
            shutdown,
        }
    }

    /// Main event loop: claim, execute, acknowledge, back off when idle.
    pub async fn run(&self) -> Result<()> {
        info!(worker_id = %self.config.worker_id, "worker entering event loop");
        let mut backoff_ms = BACKOFF_BASE_MS;
        while !self.shutdown.is_cancelled() {
            match self.queue.dequeue().await {
                Ok(Some((job_id, payload))) => {
                    backoff_ms = BACKOFF_BASE_MS;
                    self.execute(job_id, payload).await;
                }
                Ok(None) => {
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(BACKOFF_MAX_MS);
                }
                Err(e) => {
                    error!(worker_id = %self.config.worker_id, error = %e, "dequeue failed");
                    tokio::time::sleep(Duration::from_millis(BACKOFF_MAX_MS)).await;
                }
            }
        }
        info!(worker_id = %self.config.worker_id, "worker stopped");
        Ok(())
    }

    async fn execute(&self, job_id: JobId, payload: JobPayload) {
        info!(worker_id = %self.config.worker_id, job_id = %job_id, "executing job");
        let cancel = CancellationToken::new();
        let snapshot = SnapshotSlot::new();
        let poller = self.spawn_cancel_poller(job_id.clone(), cancel.clone());

        let outcome = tokio::time::timeout(
            self.config.job_timeout,
            self.handler
                .run(&job_id, payload, cancel.clone(), snapshot.clone()),
        )
        .await;
        poller.abort();

        match outcome {
            Ok(Ok(())) => {
                if let Err(e) = self.queue.ack(&job_id).await {
                    error!(job_id = %job_id, error = %e, "queue ack failed");
                }
            }
            Ok(Err(e)) => {
                warn!(job_id = %job_id, error = %e, "job handler failed");
                self.mark_failed(&job_id, &e.to_string(), None).await;
            }
            Err(_elapsed) => {
                cancel.cancel();
                warn!(
                    job_id = %job_id,
                    timeout_secs = self.config.job_timeout.as_secs(),
                    "job timed out"
                );
                // The dropped pipeline future can no longer report; the
                // slot holds whatever clusters it had assembled.
                self.mark_failed(&job_id, "timeout", snapshot.take()).await;
            }
        }
    }

    async fn mark_failed(&self, job_id: &JobId, error: &str, partial: Option<ResultPayload>) {
        // The handler may already have recorded a terminal state; a
        // TerminalJob error here is expected and ignored.
        if let Err(e) = self.store.fail_job(job_id, error, partial.as_ref()).await {
            warn!(job_id = %job_id, error = %e, "could not record job failure");
        }
        if let Err(e) = self.queue.ack(job_id).await {
            error!(job_id = %job_id, error = %e, "queue ack failed");
        }
    }

    fn spawn_cancel_poller(
        &self,
        job_id: JobId,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(CANCEL_POLL_MS)).await;
                match store.cancel_requested(&job_id).await {
                    Ok(true) => {
                        info!(job_id = %job_id, "cancellation requested");
                        cancel.cancel();
                        return;
                    }
                    Ok(false) => {}
                    Err(_) => return,
                }
            }
        })
    }
}

/// A pool of workers sharing one store, queue, and handler.
pub struct WorkerPool {
    shutdown: CancellationToken,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        concurrency: usize,
        store: Arc<dyn ProgressStore>,
        queue: Arc<dyn JobQueue>,
        handler: Arc<dyn JobHandler>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let handles = (0..concurrency.max(1))
            .map(|idx| {
                let worker = Worker::new(
                    WorkerConfig {
                        worker_id: format!("worker-{}", idx),
                        ..WorkerConfig::default()
                    },
                    Arc::clone(&store),
                    Arc::clone(&queue),
                    Arc::clone(&handler),
                    shutdown.clone(),
                );
                tokio::spawn(async move {
                    if let Err(e) = worker.run().await {
                        error!(error = %e, "worker exited with error");
                    }
                })
            })
            .collect();
        Self { shutdown, handles }
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefcheck_protocol::{InputKind, Job};
    use briefcheck_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn run(
            &self,
            job_id: &JobId,
            _payload: JobPayload,
            _cancel: CancellationToken,
            _snapshot: SnapshotSlot,
        ) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("handler exploded");
            }
            // Real handlers record their own terminal state.
            let _ = job_id;
            Ok(())
        }
    }

    async fn seeded_store() -> (Arc<MemoryStore>, JobId) {
        let store = Arc::new(MemoryStore::new());
        let job = Job::new(JobId::generate(), InputKind::Text);
        let id = job.id.clone();
        briefcheck_store::ProgressStore::create_job(store.as_ref(), &job)
            .await
            .unwrap();
        briefcheck_store::JobQueue::enqueue(
            store.as_ref(),
            &id,
            &JobPayload {
                text: "text".to_string(),
                input_kind: InputKind::Text,
            },
        )
        .await
        .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_worker_runs_claimed_job_and_acks() {
        let (store, _id) = seeded_store().await;
        let handler = Arc::new(CountingHandler {
            runs: AtomicUsize::new(0),
            fail: false,
        });
        let shutdown = CancellationToken::new();
        let worker = Worker::new(
            WorkerConfig::default(),
            store.clone() as Arc<dyn ProgressStore>,
            store.clone() as Arc<dyn JobQueue>,
            handler.clone() as Arc<dyn JobHandler>,
            shutdown.clone(),
        );

        let run = tokio::spawn(async move { worker.run().await });
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.cancel();
        run.await.unwrap().unwrap();

        assert_eq!(handler.runs.load(Ordering::SeqCst), 1);
        let stats = briefcheck_store::JobQueue::stats(store.as_ref())
            .await
            .unwrap();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.queued, 0);
    }

    #[tokio::test]
    async fn test_handler_failure_fails_job_not_worker() {
        let (store, id) = seeded_store().await;
        let handler = Arc::new(CountingHandler {
            runs: AtomicUsize::new(0),
            fail: true,
        });
        let shutdown = CancellationToken::new();
        let worker = Worker::new(
            WorkerConfig::default(),
            store.clone() as Arc<dyn ProgressStore>,
            store.clone() as Arc<dyn JobQueue>,
            handler.clone() as Arc<dyn JobHandler>,
            shutdown.clone(),
        );

        let run = tokio::spawn(async move { worker.run().await });
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.cancel();
        run.await.unwrap().unwrap();

        let job = briefcheck_store::ProgressStore::get_job(store.as_ref(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, briefcheck_protocol::JobStatus::Failed);
        assert!(job.error.as_deref().unwrap().contains("handler exploded"));
    }

    #[tokio::test]
    async fn test_job_timeout_marks_failed_with_partial_snapshot() {
        use briefcheck_protocol::payload::ResultStats;

        // Records a mid-run snapshot, then hangs past the job timeout.
        struct SlowHandler;

        #[async_trait]
        impl JobHandler for SlowHandler {
            async fn run(
                &self,
                _job_id: &JobId,
                _payload: JobPayload,
                _cancel: CancellationToken,
                snapshot: SnapshotSlot,
            ) -> Result<()> {
                snapshot.record(ResultPayload {
                    clusters: Vec::new(),
                    stats: ResultStats {
                        total_citations: 4,
                        verified: 0,
                        clusters: 2,
                    },
                });
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }

        let (store, id) = seeded_store().await;
        let shutdown = CancellationToken::new();
        let worker = Worker::new(
            WorkerConfig {
                worker_id: "t".to_string(),
                job_timeout: Duration::from_millis(100),
            },
            store.clone() as Arc<dyn ProgressStore>,
            store.clone() as Arc<dyn JobQueue>,
            Arc::new(SlowHandler) as Arc<dyn JobHandler>,
            shutdown.clone(),
        );

        let run = tokio::spawn(async move { worker.run().await });
        tokio::time::sleep(Duration::from_millis(400)).await;
        shutdown.cancel();
        run.await.unwrap().unwrap();

        let job = briefcheck_store::ProgressStore::get_job(store.as_ref(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, briefcheck_protocol::JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("timeout"));
        assert!(job.result.is_none());
        // Whatever the pipeline assembled before the timeout survives.
        let partial = job.partial_result.expect("timeout keeps the snapshot");
        assert_eq!(partial.stats.total_citations, 4);
        assert_eq!(partial.stats.clusters, 2);
    }
}
