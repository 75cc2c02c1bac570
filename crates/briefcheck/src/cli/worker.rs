//! `briefcheck worker` - run a worker pool against the shared queue.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use briefcheck::PipelineHandler;
use briefcheck_store::{JobQueue, ProgressStore};
use briefcheck_worker::WorkerPool;
use tracing::{info, warn};

use super::context::EngineContext;

/// Expired jobs are purged on this cadence while workers run.
const PURGE_INTERVAL_SECS: u64 = 3_600;

#[derive(Debug)]
pub struct WorkerArgs {
    pub concurrency: Option<usize>,
}

pub async fn run(ctx: &EngineContext, args: WorkerArgs) -> Result<()> {
    let concurrency = args.concurrency.unwrap_or(ctx.config.worker_concurrency);
    info!(concurrency, "starting worker pool");

    let handler = Arc::new(PipelineHandler::new(Arc::clone(&ctx.pipeline)));
    let pool = WorkerPool::spawn(
        concurrency,
        Arc::clone(&ctx.store) as Arc<dyn ProgressStore>,
        Arc::clone(&ctx.store) as Arc<dyn JobQueue>,
        handler,
    );

    let purge_store = Arc::clone(&ctx.store);
    let ttl = ctx.config.job_ttl_seconds;
    let purger = tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(PURGE_INTERVAL_SECS)).await;
            match purge_store.purge_expired(ttl).await {
                Ok(count) if count > 0 => info!(count, "purged expired jobs"),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "purge failed"),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    purger.abort();
    pool.shutdown();
    pool.join().await;
    Ok(())
}
