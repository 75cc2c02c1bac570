//! Engine error taxonomy.

use std::time::Duration;
use thiserror::Error;

use crate::types::VerificationFailure;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Everything the engine needs to distinguish.
///
/// Per-citation extraction and verification errors never surface here; they
/// degrade the citation in place. This taxonomy is for job-level outcomes.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("input too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("input is not decodable as UTF-8 text")]
    Undecodable,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authority rate limit exceeded")]
    RateLimited,

    #[error("no match found")]
    NotFound,

    #[error("candidate rejected: {0}")]
    MatchRejected(VerificationFailure),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("job cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Stable short code surfaced in failed-job records and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::EmptyInput | EngineError::TooLarge { .. } | EngineError::Undecodable => {
                "input"
            }
            EngineError::Transport(_) => "transport",
            EngineError::RateLimited => "rate_limited",
            EngineError::NotFound => "not_found",
            EngineError::MatchRejected(_) => "match_rejected",
            EngineError::Timeout(_) => "timeout",
            EngineError::Cancelled => "cancelled",
            EngineError::Internal(_) => "internal",
        }
    }
}
