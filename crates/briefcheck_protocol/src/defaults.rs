//! Canonical default values shared across the pipeline.

/// Authority API root (CourtListener-compatible v4 REST surface).
pub const DEFAULT_AUTHORITY_BASE_URL: &str = "https://www.courtlistener.com/api/rest/v4";
/// Batch citation-lookup endpoint, relative to the base URL.
pub const BATCH_LOOKUP_PATH: &str = "/citation-lookup/";
/// Full-text search endpoint, relative to the base URL.
pub const SEARCH_PATH: &str = "/search/";

pub const DEFAULT_RATE_LIMIT_PER_MIN: u32 = 180;
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Largest batch the authority accepts; BATCH_SIZE is clamped to this.
pub const MAX_BATCH_SIZE: usize = 50;

pub const DEFAULT_SYNC_THRESHOLD_BYTES: usize = 5_000;
/// Hard cap for `force_mode=sync`.
pub const SYNC_HARD_CAP_BYTES: usize = 100 * 1024;
/// Inputs beyond this are rejected outright.
pub const MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_JOB_TTL_SECONDS: u64 = 86_400;
pub const DEFAULT_STATE_STORE_URL: &str = "sqlite:briefcheck.db";

/// Sync wall-clock cap before a job is promoted to the queue.
pub const SYNC_WALL_CLOCK_SECS: u64 = 30;
/// Per-job overall timeout.
pub const JOB_TIMEOUT_SECS: u64 = 600;

/// Per-request timeout toward the authority.
pub const AUTHORITY_REQUEST_TIMEOUT_SECS: u64 = 20;
/// Per-batch overall timeout (request + parse + filter).
pub const BATCH_TIMEOUT_SECS: u64 = 60;
/// Verification batches allowed in flight at once within one job.
pub const MAX_BATCHES_IN_FLIGHT: usize = 4;
/// Circuit-open window after the authority signals a rate limit.
pub const CIRCUIT_OPEN_SECS: u64 = 300;

pub const CANCELLED_BY_USER_MESSAGE: &str = "Cancelled by user";
