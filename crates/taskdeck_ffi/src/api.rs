//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task list/create/update/delete/toggle to Dart via FRB.
//! - Translate core errors into flat response envelopes with stable codes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Task operations are serialized by one process-wide lock, so a
//!   read-modify-write never interleaves with another call.
//! - Store selection is resolved once per process from `TASKDECK_*` env vars.

use chrono::{NaiveDate, SecondsFormat};
use log::warn;
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};
use taskdeck_core::config::DATA_DIR_ENV;
use taskdeck_core::db::open_db;
use taskdeck_core::{
    core_version as core_version_inner, default_seed_tasks, due_proximity,
    init_logging as init_logging_inner, is_overdue, local_today, parse_due_date,
    ping as ping_inner, JsonFileGateway, MemoryGateway, Priority, RetryPolicy, RetryingGateway,
    ServiceResult, SqliteTaskGateway, StatusFilter, StoreConfig, StoreKind, Task, TaskDraft,
    TaskGateway, TaskId, TaskPatch, TaskQuery, TaskService, TaskServiceError, TaskStatistics,
    TaskValidationError,
};
use uuid::Uuid;

const DEFAULT_DATA_DIR_NAME: &str = "taskdeck";

static STORE_CONFIG: OnceLock<Result<StoreConfig, String>> = OnceLock::new();
static MEMORY_STORE: OnceLock<MemoryGateway> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Task projection for list rows and detail views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Stable task ID in string form.
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// `YYYY-MM-DD`.
    pub due_date: Option<String>,
    /// Display hint such as `Overdue`, `Due today` or `Due Feb 15, 2024`.
    pub due_label: Option<String>,
    /// `low|medium|high`.
    pub priority: String,
    pub completed: bool,
    pub overdue: bool,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub created_at: String,
}

/// Collection counters, always computed over every stored task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatsItem {
    pub total: u32,
    pub active: u32,
    pub completed: u32,
    pub overdue: u32,
    pub high_priority: u32,
    pub medium_priority: u32,
    pub low_priority: u32,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    /// Filtered tasks in display order.
    pub items: Vec<TaskItem>,
    pub stats: Option<TaskStatsItem>,
    /// Effective status filter (`all|active|completed`).
    pub applied_status: String,
    pub error_code: Option<String>,
    pub message: String,
}

/// Generic action response envelope for mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Task state after the operation; `None` for deletes and failures.
    pub task: Option<TaskItem>,
    /// Affected task ID when known.
    pub task_id: Option<String>,
    /// `validation_failed|not_found|storage_unavailable|invalid_argument`.
    pub error_code: Option<String>,
    /// Every validation reason, empty for other failures.
    pub errors: Vec<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task: Option<&Task>, task_id: TaskId) -> Self {
        Self {
            ok: true,
            task: task.map(to_task_item),
            task_id: Some(task_id.to_string()),
            error_code: None,
            errors: Vec::new(),
            message: message.into(),
        }
    }

    fn failure(op: &str, err: ApiError) -> Self {
        Self {
            ok: false,
            task: None,
            task_id: None,
            error_code: Some(err.code.to_string()),
            message: format!("{op} failed: {}", err.message),
            errors: err.reasons,
        }
    }
}

/// Flattened failure carried to the envelopes.
struct ApiError {
    code: &'static str,
    reasons: Vec<String>,
    message: String,
}

impl ApiError {
    fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: "invalid_argument",
            reasons: Vec::new(),
            message: message.into(),
        }
    }

    fn storage(message: impl Into<String>) -> Self {
        Self {
            code: "storage_unavailable",
            reasons: Vec::new(),
            message: message.into(),
        }
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(value: TaskServiceError) -> Self {
        Self {
            code: value.code(),
            reasons: value.reasons().to_vec(),
            message: value.to_string(),
        }
    }
}

impl From<TaskValidationError> for ApiError {
    fn from(value: TaskValidationError) -> Self {
        TaskServiceError::Validation(value).into()
    }
}

/// Lists tasks filtered by `status` (`all|active|completed`, blank = all)
/// and free-text `search`, sorted for display.
///
/// # FFI contract
/// - Sync call, store-backed execution.
/// - Never panics.
/// - `stats` covers the whole collection regardless of filters.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list(status: String, search: String) -> TaskListResponse {
    let status = match StatusFilter::parse(&status) {
        Ok(status) => status,
        Err(err) => {
            return TaskListResponse::failure(
                StatusFilter::All,
                ApiError::invalid_argument(err.to_string()),
            )
        }
    };

    match with_task_service(|service| service.view(&TaskQuery::new(status, search))) {
        Ok(view) => {
            let today = local_today();
            let items = view
                .items
                .iter()
                .map(|task| to_task_item_on(task, today))
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No tasks.".to_string()
            } else {
                format!("Found {} task(s).", items.len())
            };
            TaskListResponse {
                ok: true,
                items,
                stats: Some(to_stats_item(&view.stats)),
                applied_status: status.as_str().to_string(),
                error_code: None,
                message,
            }
        }
        Err(err) => TaskListResponse::failure(status, err),
    }
}

impl TaskListResponse {
    fn failure(status: StatusFilter, err: ApiError) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            stats: None,
            applied_status: status.as_str().to_string(),
            error_code: Some(err.code.to_string()),
            message: format!("task_list failed: {}", err.message),
        }
    }
}

/// Creates a task. Blank optional strings are treated as absent.
///
/// # FFI contract
/// - Sync call, store-backed execution.
/// - Never panics.
/// - On validation failure `errors` lists every reason and nothing is stored.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<String>,
) -> TaskActionResponse {
    let result = build_draft(title, description, due_date, priority)
        .and_then(|draft| with_task_service(|service| service.create(&draft)));
    match result {
        Ok(task) => TaskActionResponse::success("Task created.", Some(&task), task.id),
        Err(err) => TaskActionResponse::failure("task_create", err),
    }
}

/// Updates the provided fields of a task.
///
/// Input semantics:
/// - `None` leaves a field untouched.
/// - `Some("")` clears `description` or `due_date`.
///
/// # FFI contract
/// - Never panics.
/// - Unknown ids return `not_found`; invalid merges return
///   `validation_failed` and leave the stored record unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    id: String,
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<String>,
    completed: Option<bool>,
) -> TaskActionResponse {
    let result = parse_task_id(&id).and_then(|task_id| {
        let patch = build_patch(title, description, due_date, priority, completed)?;
        with_task_service(|service| service.update(task_id, &patch))
    });
    match result {
        Ok(task) => TaskActionResponse::success("Task updated.", Some(&task), task.id),
        Err(err) => TaskActionResponse::failure("task_update", err),
    }
}

/// Permanently deletes a task.
///
/// # FFI contract
/// - Never panics.
/// - Returns the deleted id in `task_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskActionResponse {
    let result = parse_task_id(&id)
        .and_then(|task_id| with_task_service(|service| service.delete(task_id)));
    match result {
        Ok(task_id) => TaskActionResponse::success("Task deleted.", None, task_id),
        Err(err) => TaskActionResponse::failure("task_delete", err),
    }
}

/// Flips the completion flag of a task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: String) -> TaskActionResponse {
    let result = parse_task_id(&id)
        .and_then(|task_id| with_task_service(|service| service.toggle_completion(task_id)));
    match result {
        Ok(task) => TaskActionResponse::success("Task updated.", Some(&task), task.id),
        Err(err) => TaskActionResponse::failure("task_toggle", err),
    }
}

fn build_draft(
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<String>,
) -> Result<TaskDraft, ApiError> {
    let mut draft = TaskDraft::new(title);
    draft.description = description.filter(|value| !value.trim().is_empty());
    draft.due_date = parse_optional_due_date(due_date.as_deref())?;
    draft.priority = parse_optional_priority(priority.as_deref())?;
    Ok(draft)
}

fn build_patch(
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<String>,
    completed: Option<bool>,
) -> Result<TaskPatch, ApiError> {
    let due_date = match due_date {
        Some(raw) => Some(parse_optional_due_date(Some(&raw))?),
        None => None,
    };
    Ok(TaskPatch {
        title,
        description: description.map(|value| Some(value).filter(|v| !v.trim().is_empty())),
        due_date,
        priority: parse_optional_priority(priority.as_deref())?,
        completed,
    })
}

fn parse_optional_due_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_due_date(value).map(Some).ok_or_else(|| {
            TaskValidationError::new(vec![format!(
                "Invalid due date `{value}`; expected YYYY-MM-DD"
            )])
            .into()
        }),
    }
}

fn parse_optional_priority(raw: Option<&str>) -> Result<Option<Priority>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Priority::parse(value)
            .map(Some)
            .map_err(|err| TaskValidationError::from(err).into()),
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::invalid_argument(format!("invalid task id `{}`", raw.trim())))
}

fn resolve_store_config() -> Result<StoreConfig, String> {
    STORE_CONFIG
        .get_or_init(|| {
            let default_dir = std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME);
            StoreConfig::from_lookup(|key| match std::env::var(key) {
                Ok(value) => Some(value),
                Err(_) if key == DATA_DIR_ENV => Some(default_dir.to_string_lossy().into_owned()),
                Err(_) => None,
            })
            .map_err(|err| {
                warn!("event=store_config module=ffi status=error error={err}");
                err.to_string()
            })
        })
        .clone()
}

fn with_task_service<T>(
    f: impl FnOnce(&TaskService<&dyn TaskGateway>) -> ServiceResult<T>,
) -> Result<T, ApiError> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let config = resolve_store_config().map_err(ApiError::storage)?;

    match config.kind {
        StoreKind::Memory => {
            let gateway =
                MEMORY_STORE.get_or_init(|| MemoryGateway::uninitialized(default_seed_tasks()));
            run_with(gateway, f)
        }
        StoreKind::JsonFile => run_with(&JsonFileGateway::new(config.store_path()), f),
        StoreKind::Sqlite => {
            let path = config.store_path();
            ensure_parent_dir(&path)?;
            let conn = open_db(&path)
                .map_err(|err| ApiError::storage(format!("task DB open failed: {err}")))?;
            let gateway =
                RetryingGateway::new(SqliteTaskGateway::new(&conn), RetryPolicy::default());
            run_with(&gateway, f)
        }
    }
}

fn run_with<T>(
    gateway: &dyn TaskGateway,
    f: impl FnOnce(&TaskService<&dyn TaskGateway>) -> ServiceResult<T>,
) -> Result<T, ApiError> {
    let service = TaskService::new(gateway);
    f(&service).map_err(ApiError::from)
}

fn ensure_parent_dir(path: &Path) -> Result<(), ApiError> {
    let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|err| {
        ApiError::storage(format!(
            "failed to create data directory `{}`: {err}",
            parent.display()
        ))
    })
}

fn to_task_item(task: &Task) -> TaskItem {
    to_task_item_on(task, local_today())
}

fn to_task_item_on(task: &Task, today: NaiveDate) -> TaskItem {
    let proximity = due_proximity(task, today);
    TaskItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        due_date: task.due_date.map(|date| date.format("%Y-%m-%d").to_string()),
        due_label: task
            .due_date
            .zip(proximity)
            .map(|(date, proximity)| proximity.label(date)),
        priority: task.priority.as_str().to_string(),
        completed: task.completed,
        overdue: is_overdue(task, today),
        created_at: task.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

fn to_stats_item(stats: &TaskStatistics) -> TaskStatsItem {
    TaskStatsItem {
        total: count(stats.total),
        active: count(stats.active),
        completed: count(stats.completed),
        overdue: count(stats.overdue),
        high_priority: count(stats.high_priority),
        medium_priority: count(stats.medium_priority),
        low_priority: count(stats.low_priority),
    }
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
