//! Proximity clustering, context propagation, and canonical splitting.
//!
//! Clustering runs before verification and reads only the document;
//! splitting runs after verification and only divides, never merges. Between
//! the two, context metadata propagates within clusters.

pub mod paren;
pub mod propagate;
pub mod proximity;
pub mod splitter;

pub use paren::crosses_parenthetical_boundary;
pub use propagate::propagate_context;
pub use proximity::{cluster, PROXIMITY_THRESHOLD};
pub use splitter::split_by_canonical;
