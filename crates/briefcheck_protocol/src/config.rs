//! Engine configuration, read once from the environment.

use crate::defaults;

/// The only configuration surface the engine reads.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Authority API key; verification runs unauthenticated (and heavily
    /// throttled upstream) without one.
    pub authority_api_key: Option<String>,
    pub authority_base_url: String,
    pub rate_limit_per_min: u32,
    /// Citations per batch-lookup call, clamped to 1..=50.
    pub batch_size: usize,
    /// Inputs below this run synchronously.
    pub sync_threshold_bytes: usize,
    pub job_ttl_seconds: u64,
    pub worker_concurrency: usize,
    pub state_store_url: String,
    /// Alternate verification sources, tried in order, each once per citation.
    pub alt_sources: Vec<String>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup; the seam tests inject through.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let batch_size = parse_or(&lookup, "BATCH_SIZE", defaults::DEFAULT_BATCH_SIZE)
            .clamp(1, defaults::MAX_BATCH_SIZE);
        Self {
            authority_api_key: lookup("AUTHORITY_API_KEY").filter(|v| !v.is_empty()),
            authority_base_url: lookup("AUTHORITY_BASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| defaults::DEFAULT_AUTHORITY_BASE_URL.to_string()),
            rate_limit_per_min: parse_or(
                &lookup,
                "RATE_LIMIT_PER_MIN",
                defaults::DEFAULT_RATE_LIMIT_PER_MIN,
            ),
            batch_size,
            sync_threshold_bytes: parse_or(
                &lookup,
                "SYNC_THRESHOLD_BYTES",
                defaults::DEFAULT_SYNC_THRESHOLD_BYTES,
            ),
            job_ttl_seconds: parse_or(&lookup, "JOB_TTL_SECONDS", defaults::DEFAULT_JOB_TTL_SECONDS),
            worker_concurrency: parse_or(&lookup, "WORKER_CONCURRENCY", default_concurrency()),
            state_store_url: lookup("STATE_STORE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| defaults::DEFAULT_STATE_STORE_URL.to_string()),
            alt_sources: lookup("ALT_SOURCES")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(default)
}
