//! Persistence gateways for the task collection.
//!
//! # Responsibility
//! - Define the whole-collection load/save contract used by the service.
//! - Provide interchangeable backends selected at startup.
//!
//! # Invariants
//! - `save_all` replaces the stored collection atomically for readers of the
//!   same gateway; no partial collection is ever observable.
//! - `load_all` seeds a store that does not exist yet, and returns an empty
//!   collection for a store that exists but holds no tasks.
//! - Read paths reject invalid persisted state instead of masking it.
//! - No cross-operation locking: concurrent writers race, last write wins.

use crate::db::DbError;
use crate::model::task::Task;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod json_file;
pub mod memory;
pub mod retry;
pub mod seed;
pub mod sqlite;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Storage failure. Every variant surfaces as "storage unavailable" to callers.
#[derive(Debug)]
pub enum GatewayError {
    Io { path: PathBuf, source: io::Error },
    Db(DbError),
    Serialization(serde_json::Error),
    /// Persisted state violates a record or collection invariant.
    InvalidData(String),
}

impl GatewayError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only lock contention and interrupted/timed-out I/O qualify; corrupt
    /// data and missing permissions never clear on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            Self::Db(err) => err.is_busy(),
            Self::Serialization(_) | Self::InvalidData(_) => false,
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "task store `{}` unavailable: {source}", path.display())
            }
            Self::Db(err) => write!(f, "task table unavailable: {err}"),
            Self::Serialization(err) => write!(f, "task store is not valid JSON: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for GatewayError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Whole-collection storage capability.
///
/// Implementations are selected at startup; the service only sees this trait.
pub trait TaskGateway {
    /// Stable backend label for diagnostics (`json_file`, `sqlite`, ...).
    fn backend_name(&self) -> &'static str;

    /// Reads the full collection, seeding the store on first use.
    fn load_all(&self) -> GatewayResult<Vec<Task>>;

    /// Replaces the full collection.
    fn save_all(&self, tasks: &[Task]) -> GatewayResult<()>;
}

impl<G: TaskGateway + ?Sized> TaskGateway for Box<G> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn load_all(&self) -> GatewayResult<Vec<Task>> {
        (**self).load_all()
    }

    fn save_all(&self, tasks: &[Task]) -> GatewayResult<()> {
        (**self).save_all(tasks)
    }
}

impl<G: TaskGateway + ?Sized> TaskGateway for &G {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn load_all(&self) -> GatewayResult<Vec<Task>> {
        (**self).load_all()
    }

    fn save_all(&self, tasks: &[Task]) -> GatewayResult<()> {
        (**self).save_all(tasks)
    }
}

/// Checks every record and id uniqueness for a collection read from storage.
pub fn validate_collection(tasks: &[Task]) -> GatewayResult<()> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        task.validate()
            .map_err(|err| GatewayError::InvalidData(format!("task {}: {err}", task.id)))?;
        if !seen.insert(task.id) {
            return Err(GatewayError::InvalidData(format!(
                "duplicate task id {}",
                task.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_collection, GatewayError};
    use crate::model::task::{Task, TaskDraft};
    use chrono::Utc;
    use std::io;
    use uuid::Uuid;

    #[test]
    fn duplicate_ids_are_rejected() {
        let task = Task::from_draft(Uuid::new_v4(), Utc::now(), &TaskDraft::new("a"));
        let err = validate_collection(&[task.clone(), task]).unwrap_err();
        assert!(err.to_string().contains("duplicate task id"));
    }

    #[test]
    fn only_interrupted_or_timed_out_io_is_transient() {
        let timed_out = GatewayError::io("todos.json", io::Error::from(io::ErrorKind::TimedOut));
        let denied = GatewayError::io(
            "todos.json",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(timed_out.is_transient());
        assert!(!denied.is_transient());
        assert!(!GatewayError::InvalidData("bad".to_string()).is_transient());
    }
}
