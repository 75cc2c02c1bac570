//! Batched verification against the external citation authority.
//!
//! Primary path is the batch-lookup endpoint in chunks of up to 50; the
//! search endpoint and configured alternate sources back it up. A
//! process-global token bucket with a rate-limit circuit breaker paces every
//! request, and the match acceptance filter keeps wrong canonical data out.

pub mod accept;
pub mod alternates;
pub mod authority;
pub mod error;
pub mod mock;
pub mod rate_limit;
pub mod verifier;
pub mod wire;

pub use accept::{accept_candidates, NAME_SIMILARITY_THRESHOLD, YEAR_DISTANCE_MAX};
pub use alternates::{AlternateAuthority, AlternateRegistry};
pub use authority::{AuthorityApi, HttpAuthority};
pub use error::VerifyError;
pub use mock::MockAuthority;
pub use rate_limit::RateLimiter;
pub use verifier::Verifier;
pub use wire::{BatchEntry, CaseCandidate, SearchResponse};
