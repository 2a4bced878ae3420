//! Optimistic in-memory collections backed by a per-kind persistence queue.

mod coordinator;

pub use coordinator::*;
