//! Background workers for async jobs.
//!
//! The job queue delivers exactly one job to exactly one worker; a worker
//! runs the full pipeline for its job in isolation. Multiple jobs run in
//! parallel across the pool, sharing one process-global rate limiter through
//! the handler.

pub mod worker;

pub use worker::{JobHandler, Worker, WorkerConfig, WorkerPool};
