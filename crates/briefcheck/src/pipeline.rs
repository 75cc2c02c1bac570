//! End-to-end pipeline orchestration.
//!
//! One job flows through extract, cluster, propagate, verify, split, and
//! assemble; each stage publishes progress to the shared store so a
//! stateless front-end can poll. Cancellation is checked at every progress
//! point; network boundaries are checked inside the verifier.

use std::sync::Arc;

use briefcheck_cluster::{cluster, propagate_context, split_by_canonical};
use briefcheck_extract::extract;
use briefcheck_logging::job_span;
use briefcheck_protocol::{
    CancellationToken, EngineConfig, EngineError, JobId, ResultPayload, SnapshotSlot,
};
use briefcheck_store::ProgressStore;
use briefcheck_verify::{AlternateRegistry, AuthorityApi, RateLimiter, Verifier};
use tracing::{info, warn, Instrument};

/// Stage boundaries in the published progress percentage.
const PCT_EXTRACTING: u8 = 0;
const PCT_CLUSTERING: u8 = 20;
const PCT_VERIFYING: u8 = 25;
const PCT_ASSEMBLING: u8 = 90;
const VERIFY_SPAN: u8 = PCT_ASSEMBLING - PCT_VERIFYING;

pub struct Pipeline {
    store: Arc<dyn ProgressStore>,
    authority: Arc<dyn AuthorityApi>,
    limiter: Arc<RateLimiter>,
    alternates: AlternateRegistry,
    config: EngineConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        authority: Arc<dyn AuthorityApi>,
        limiter: Arc<RateLimiter>,
        config: EngineConfig,
    ) -> Self {
        let alternates = AlternateRegistry::from_names(&config.alt_sources);
        Self {
            store,
            authority,
            limiter,
            alternates,
            config,
        }
    }

    pub fn with_alternates(mut self, alternates: AlternateRegistry) -> Self {
        self.alternates = alternates;
        self
    }

    /// Run the pipeline and record the terminal state in the store.
    ///
    /// Completed jobs always carry the full payload, however many citations
    /// stayed unverified; failed jobs carry the error kind and no result.
    /// Stage snapshots land in `snapshot` so the caller can attach a
    /// partial result if it kills the run on the per-job timeout.
    pub async fn run_to_completion(
        &self,
        job_id: &JobId,
        text: &str,
        cancel: &CancellationToken,
        snapshot: &SnapshotSlot,
    ) -> Result<ResultPayload, EngineError> {
        let span = job_span(job_id.as_str());
        match self.run(job_id, text, cancel, snapshot).instrument(span).await {
            Ok(payload) => {
                self.store
                    .complete_job(job_id, &payload)
                    .await
                    .map_err(|e| EngineError::Transport(e.to_string()))?;
                Ok(payload)
            }
            Err(error) => {
                if let Err(store_err) = self.store.fail_job(job_id, error.kind(), None).await {
                    warn!(job_id = %job_id, error = %store_err, "could not record failure");
                }
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        job_id: &JobId,
        text: &str,
        cancel: &CancellationToken,
        snapshot: &SnapshotSlot,
    ) -> Result<ResultPayload, EngineError> {
        self.publish(job_id, cancel, PCT_EXTRACTING, "extracting").await?;
        let citations = extract(text);
        info!(citations = citations.len(), "extraction done");

        self.publish(job_id, cancel, PCT_CLUSTERING, "clustering").await?;
        let mut clusters = cluster(citations, text);
        propagate_context(&mut clusters);
        // First point where clusters exist: a timeout from here on can
        // still surface them, unverified.
        snapshot.record(ResultPayload::from_clusters(&clusters));

        self.publish(job_id, cancel, PCT_VERIFYING, "verifying").await?;
        let verifier = Verifier::new(
            Arc::clone(&self.authority),
            Arc::clone(&self.limiter),
            &self.config,
        )
        .with_alternates(self.alternates.clone());

        // The batch callback is synchronous; progress writes are forwarded
        // through a channel so the store stays async-only.
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<(usize, usize)>();
        let forward_store = Arc::clone(&self.store);
        let forward_id = job_id.clone();
        let forwarder = tokio::spawn(async move {
            while let Some((done, total)) = rx.recv().await {
                let pct = PCT_VERIFYING
                    + ((u32::from(VERIFY_SPAN) * done as u32) / (total.max(1) as u32)) as u8;
                let step = format!("verifying_batch_{}_of_{}", done, total);
                if let Err(e) = forward_store.update_progress(&forward_id, pct, &step).await {
                    warn!(job_id = %forward_id, error = %e, "progress write failed");
                    return;
                }
            }
        });
        let verify_result = verifier
            .verify(&mut clusters, cancel, |done, total| {
                let _ = tx.send((done, total));
            })
            .await;
        drop(tx);
        let _ = forwarder.await;
        verify_result?;

        let clusters = split_by_canonical(clusters);

        self.publish(job_id, cancel, PCT_ASSEMBLING, "assembling").await?;
        let payload = ResultPayload::from_clusters(&clusters);
        snapshot.record(payload.clone());
        Ok(payload)
    }

    async fn publish(
        &self,
        job_id: &JobId,
        cancel: &CancellationToken,
        pct: u8,
        step: &str,
    ) -> Result<(), EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        self.store
            .update_progress(job_id, pct, step)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))
    }
}
