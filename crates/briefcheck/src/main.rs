//! BriefCheck launcher.
//!
//! Usage:
//!     briefcheck submit --file brief.txt
//!     briefcheck poll <job-id> --watch
//!     briefcheck worker --concurrency 4

use anyhow::Result;
use briefcheck_logging::LogConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::context::EngineContext;

#[derive(Parser, Debug)]
#[command(name = "briefcheck", about = "Legal citation extraction and verification engine")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a document for citation checking
    Submit {
        /// Read the document from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Pass the document text directly
        #[arg(short, long)]
        text: Option<String>,

        /// Force execution mode (sync or async)
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Poll a submitted job
    Poll {
        /// Job ID returned at submission
        job_id: String,

        /// Keep polling until the job is terminal
        #[arg(short, long)]
        watch: bool,
    },

    /// Request cancellation of a running job
    Cancel {
        /// Job ID to cancel
        job_id: String,
    },

    /// Run a pool of background workers
    Worker {
        /// Worker count (default: WORKER_CONCURRENCY or CPU count)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Extract and cluster citations without verification
    Extract {
        /// Read the document from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Pass the document text directly
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Show job queue statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = briefcheck_logging::init_logging(LogConfig {
        app_name: "briefcheck",
        verbose: args.verbose,
    })?;

    match args.command {
        Commands::Submit { file, text, mode } => {
            let ctx = EngineContext::init().await?;
            cli::submit::run(&ctx, cli::submit::SubmitArgs { file, text, mode }).await
        }
        Commands::Poll { job_id, watch } => {
            let ctx = EngineContext::init().await?;
            cli::poll::run(&ctx, cli::poll::PollArgs { job_id, watch }).await
        }
        Commands::Cancel { job_id } => {
            let ctx = EngineContext::init().await?;
            cli::poll::run_cancel(&ctx, job_id).await
        }
        Commands::Worker { concurrency } => {
            let ctx = EngineContext::init().await?;
            cli::worker::run(&ctx, cli::worker::WorkerArgs { concurrency }).await
        }
        Commands::Extract { file, text } => {
            cli::extract::run(cli::extract::ExtractArgs { file, text })
        }
        Commands::Stats => {
            let ctx = EngineContext::init().await?;
            cli::stats::run(&ctx).await
        }
    }
}
