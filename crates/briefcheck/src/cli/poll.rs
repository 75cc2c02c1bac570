//! `briefcheck poll` - poll a job, `briefcheck cancel` - request cancel.

use std::time::Duration;

use anyhow::{bail, Result};
use briefcheck_protocol::JobId;

use super::context::EngineContext;

#[derive(Debug)]
pub struct PollArgs {
    pub job_id: String,
    pub watch: bool,
}

pub async fn run(ctx: &EngineContext, args: PollArgs) -> Result<()> {
    let job_id = JobId::new(args.job_id);
    loop {
        let Some(response) = ctx.router.poll(&job_id).await? else {
            bail!("No such job: {}", job_id);
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        if !args.watch || response.status.is_terminal() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

pub async fn run_cancel(ctx: &EngineContext, job_id: String) -> Result<()> {
    let job_id = JobId::new(job_id);
    ctx.router.cancel(&job_id).await?;
    println!("{{\"job_id\": \"{}\", \"cancel_requested\": true}}", job_id);
    Ok(())
}
