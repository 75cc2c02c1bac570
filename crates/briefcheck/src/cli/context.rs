//! Engine wiring for CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use briefcheck::{Pipeline, Router};
use briefcheck_protocol::EngineConfig;
use briefcheck_store::{JobQueue, ProgressStore, SqliteStore};
use briefcheck_verify::{AuthorityApi, HttpAuthority, RateLimiter};

/// Everything a command needs, built once from the environment.
pub struct EngineContext {
    pub config: EngineConfig,
    pub store: Arc<SqliteStore>,
    pub pipeline: Arc<Pipeline>,
    pub router: Router,
}

impl EngineContext {
    pub async fn init() -> Result<Self> {
        let config = EngineConfig::from_env();
        let store = Arc::new(
            SqliteStore::open(&config.state_store_url)
                .await
                .with_context(|| format!("Failed to open state store: {}", config.state_store_url))?,
        );
        let authority: Arc<dyn AuthorityApi> = Arc::new(
            HttpAuthority::new(&config).context("Failed to build authority client")?,
        );
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_min));
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&store) as Arc<dyn ProgressStore>,
            authority,
            limiter,
            config.clone(),
        ));
        let router = Router::new(
            Arc::clone(&pipeline),
            Arc::clone(&store) as Arc<dyn ProgressStore>,
            Arc::clone(&store) as Arc<dyn JobQueue>,
            config.clone(),
        );
        Ok(Self {
            config,
            store,
            pipeline,
            router,
        })
    }
}

/// Resolve the input text for commands that take `--file`, `--text`, or
/// stdin.
pub fn read_input(file: Option<std::path::PathBuf>, text: Option<String>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    if let Some(text) = text {
        return Ok(text);
    }
    use std::io::Read;
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}
