//! BriefCheck: legal citation extraction, clustering, and verification.
//!
//! The pipeline ingests legal prose, locates every citation, groups
//! parallel citations into clusters, verifies clusters against the external
//! authority, and emits a structured result. Small inputs run synchronously;
//! larger ones go through the durable queue to the worker pool, with
//! progress in the shared store either way.

pub mod handler;
pub mod pipeline;
pub mod router;

pub use handler::PipelineHandler;
pub use pipeline::Pipeline;
pub use router::{RouteOutcome, Router};
