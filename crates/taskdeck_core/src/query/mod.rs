//! Pure query functions over a task collection.
//!
//! # Invariants
//! - Nothing here mutates its input or touches storage.
//! - "Today" is always passed in, so results are reproducible in tests.

pub mod stats;
pub mod task_query;
