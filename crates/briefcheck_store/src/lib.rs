//! Shared progress/result store and durable job queue.
//!
//! The web layer polls, workers write; both go through the `ProgressStore`
//! and `JobQueue` traits. The SQLite backend is the durable default; the
//! in-memory backend serves tests and ephemeral sync runs.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{JobQueue, ProgressStore, QueueStats, MAX_RETRY_COUNT};
