//! Core data model for the BriefCheck citation engine.
//!
//! Two disjoint sets of citation metadata flow through the pipeline:
//!
//! - `extracted_*` fields come exclusively from the input document and are
//!   written by the extractor (and the in-cluster propagator).
//! - `canonical_*` fields come exclusively from the authority service and are
//!   written by the verifier.
//!
//! The types in this crate enforce that separation structurally: nothing
//! downstream of the verifier may rewrite extracted data, and clustering
//! never reads canonical data.

pub mod cancel;
pub mod config;
pub mod defaults;
pub mod error;
pub mod payload;
pub mod snapshot;
pub mod types;

// Re-export types for convenience
pub use types::{
    Citation,
    Cluster,
    ClusterId,
    ClusterType,
    InputKind,
    Job,
    JobId,
    JobPayload,
    JobStatus,
    Jurisdiction,
    RegionalGroup,
    RunMode,
    Span,
    VerificationFailure,
    VerificationResult,
    VerificationSource,
    VerifiedStatus,
};

pub use payload::{
    AckStatus, CitationPayload, ClusterPayload, PollResponse, ResultPayload, ResultStats,
    SubmitAck,
};

pub use cancel::CancellationToken;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use snapshot::SnapshotSlot;
