//! `briefcheck stats` - queue statistics.

use anyhow::Result;
use briefcheck_store::JobQueue;

use super::context::EngineContext;

pub async fn run(ctx: &EngineContext) -> Result<()> {
    let stats = ctx.store.stats().await?;
    let json = serde_json::json!({
        "queued": stats.queued,
        "running": stats.running,
        "completed": stats.completed,
        "failed": stats.failed,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
