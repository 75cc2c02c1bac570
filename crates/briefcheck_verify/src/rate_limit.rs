//! Process-global token bucket with a rate-limit circuit breaker.
//!
//! One bucket is shared by every worker in the process; if workers run in
//! separate processes each owns its own bucket and the per-minute budget is
//! divided accordingly by configuration.

use std::time::Duration;

use briefcheck_protocol::defaults::CIRCUIT_OPEN_SECS;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::error::VerifyError;

/// Burst capacity; the authority accepts batches of this size.
const BUCKET_CAPACITY: f64 = 50.0;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
    circuit_open_until: Option<Instant>,
}

/// Token bucket at `per_min` requests per minute toward the authority.
pub struct RateLimiter {
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    pub fn new(per_min: u32) -> Self {
        Self {
            refill_per_sec: f64::from(per_min.max(1)) / 60.0,
            state: Mutex::new(BucketState {
                tokens: BUCKET_CAPACITY,
                last_refill: Instant::now(),
                circuit_open_until: None,
            }),
        }
    }

    /// Take one token, waiting for refill when the bucket is empty.
    /// Fails fast with `CircuitOpen` while the breaker is open.
    pub async fn acquire(&self) -> Result<(), VerifyError> {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                if let Some(until) = state.circuit_open_until {
                    if Instant::now() < until {
                        return Err(VerifyError::CircuitOpen);
                    }
                    state.circuit_open_until = None;
                }
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return Ok(());
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Non-blocking variant; true if a token was taken.
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.circuit_open_until.is_some() {
            return false;
        }
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Open the breaker after the authority signals a rate limit; all
    /// remaining verifications for the job fall back or stay unverified.
    pub async fn open_circuit(&self) {
        let mut state = self.state.lock().await;
        let until = Instant::now() + Duration::from_secs(CIRCUIT_OPEN_SECS);
        if state.circuit_open_until.is_none() {
            warn!(
                open_secs = CIRCUIT_OPEN_SECS,
                "authority rate limit hit, opening circuit"
            );
        }
        state.circuit_open_until = Some(until);
    }

    pub async fn circuit_open(&self) -> bool {
        let state = self.state.lock().await;
        match state.circuit_open_until {
            Some(until) => Instant::now() < until,
            None => false,
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(BUCKET_CAPACITY);
        state.last_refill = now;
    }
}
