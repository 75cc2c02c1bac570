//! CLI commands for the briefcheck binary.
//!
//! Each subcommand is one file; `context` wires the engine together from
//! the environment.

pub mod context;
pub mod extract;
pub mod poll;
pub mod stats;
pub mod submit;
pub mod worker;
