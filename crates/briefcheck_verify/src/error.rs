//! Verification error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VerifyError>;

/// Transport-level failures toward the authority. Per-citation acceptance
/// rejections are `VerificationFailure` values, not errors.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("authority signalled rate limit")]
    RateLimited,

    #[error("circuit open after rate limit signal")]
    CircuitOpen,

    #[error("request timed out")]
    Timeout,

    #[error("undecodable authority response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VerifyError::Timeout
        } else if err.is_decode() {
            VerifyError::Decode(err.to_string())
        } else {
            VerifyError::Http(err.to_string())
        }
    }
}
