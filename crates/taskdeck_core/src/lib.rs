//! Core domain logic for TaskDeck.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod service;
pub mod store;

pub use config::{ConfigError, StoreConfig, StoreKind};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    parse_due_date, validate_task_fields, ParsePriorityError, Priority, Task, TaskDraft, TaskId,
    TaskPatch, TaskValidationError, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS,
};
pub use query::stats::{task_statistics, TaskStatistics};
pub use query::task_query::{
    build_view, compare_tasks, due_proximity, filter_tasks, is_overdue, local_today, sort_tasks,
    DueProximity, ParseStatusFilterError, StatusFilter, TaskQuery, TaskView,
};
pub use service::task_service::{ServiceResult, TaskService, TaskServiceError};
pub use store::json_file::JsonFileGateway;
pub use store::memory::MemoryGateway;
pub use store::retry::{RetryPolicy, RetryingGateway};
pub use store::seed::default_seed_tasks;
pub use store::sqlite::SqliteTaskGateway;
pub use store::{GatewayError, GatewayResult, TaskGateway};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
