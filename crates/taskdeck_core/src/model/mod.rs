//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by every storage backend.
//! - Own field-level validation rules used by write and read paths.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is permanent; there are no tombstones or history rows.

pub mod task;
