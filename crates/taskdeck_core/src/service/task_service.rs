//! Task use-case service.
//!
//! # Responsibility
//! - Provide list/create/update/delete/toggle entry points for UI callers.
//! - Run each mutation as one full read and one full write through the gateway.
//!
//! # Invariants
//! - Validation failures never reach storage.
//! - `NotFound` is returned before any write happens.
//! - Service APIs stay storage-agnostic; only [`TaskGateway`] is used.

use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch, TaskValidationError};
use crate::query::task_query::{build_view, local_today, TaskQuery, TaskView};
use crate::store::{GatewayError, TaskGateway};
use chrono::{SubsecRound, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, TaskServiceError>;

/// Typed outcome of a failed task operation.
#[derive(Debug)]
pub enum TaskServiceError {
    /// User-correctable input error.
    Validation(TaskValidationError),
    /// Referenced task does not exist.
    NotFound(TaskId),
    /// Backing store could not be read or written.
    Storage(GatewayError),
}

impl TaskServiceError {
    /// Stable machine-readable code for boundary layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_unavailable",
        }
    }

    /// Validation reasons, empty for other kinds.
    pub fn reasons(&self) -> &[String] {
        match self {
            Self::Validation(err) => err.reasons(),
            _ => &[],
        }
    }
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GatewayError> for TaskServiceError {
    fn from(value: GatewayError) -> Self {
        Self::Storage(value)
    }
}

/// Task service facade over one gateway.
pub struct TaskService<G: TaskGateway> {
    gateway: G,
}

impl<G: TaskGateway> TaskService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the full collection in storage order.
    pub fn list(&self) -> ServiceResult<Vec<Task>> {
        self.gateway.load_all().map_err(|err| {
            self.log_failure("task_list", None, &err);
            err.into()
        })
    }

    pub fn get(&self, id: TaskId) -> ServiceResult<Task> {
        self.list()?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or(TaskServiceError::NotFound(id))
    }

    /// Validates and appends a new task.
    ///
    /// # Contract
    /// - Storage is not read when validation fails.
    /// - New tasks get a v4 id, `completed = false` and `created_at = now`
    ///   truncated to milliseconds.
    pub fn create(&self, draft: &TaskDraft) -> ServiceResult<Task> {
        if let Err(err) = draft.validate() {
            info!(
                "event=task_create module=service status=rejected reason_count={}",
                err.reasons().len()
            );
            return Err(err.into());
        }

        let mut tasks = self.load("task_create", None)?;
        let task = Task::from_draft(Uuid::new_v4(), Utc::now().trunc_subsecs(3), draft);
        tasks.push(task.clone());
        self.save("task_create", Some(task.id), &tasks)?;

        info!(
            "event=task_create module=service status=ok task_id={} backend={}",
            task.id,
            self.gateway.backend_name()
        );
        Ok(task)
    }

    /// Merges `patch` into an existing task and persists the result.
    ///
    /// # Contract
    /// - Fields absent from `patch` are untouched.
    /// - The merged record is re-validated; on failure nothing is written.
    pub fn update(&self, id: TaskId, patch: &TaskPatch) -> ServiceResult<Task> {
        let mut tasks = self.load("task_update", Some(id))?;
        let index = position_of(&tasks, id)?;

        let updated = tasks[index].merged(patch);
        if let Err(err) = updated.validate() {
            info!(
                "event=task_update module=service status=rejected task_id={id} reason_count={}",
                err.reasons().len()
            );
            return Err(err.into());
        }
        if patch.is_empty() {
            return Ok(updated);
        }

        tasks[index] = updated.clone();
        self.save("task_update", Some(id), &tasks)?;

        info!("event=task_update module=service status=ok task_id={id}");
        Ok(updated)
    }

    /// Permanently removes a task and returns its id.
    pub fn delete(&self, id: TaskId) -> ServiceResult<TaskId> {
        let mut tasks = self.load("task_delete", Some(id))?;
        let index = position_of(&tasks, id)?;

        tasks.remove(index);
        self.save("task_delete", Some(id), &tasks)?;

        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(id)
    }

    /// Flips `completed` and returns the updated task.
    pub fn toggle_completion(&self, id: TaskId) -> ServiceResult<Task> {
        let mut tasks = self.load("task_toggle", Some(id))?;
        let index = position_of(&tasks, id)?;

        tasks[index].completed = !tasks[index].completed;
        let updated = tasks[index].clone();
        self.save("task_toggle", Some(id), &tasks)?;

        info!(
            "event=task_toggle module=service status=ok task_id={id} completed={}",
            updated.completed
        );
        Ok(updated)
    }

    /// Filtered, ordered tasks plus statistics, evaluated against the local day.
    pub fn view(&self, query: &TaskQuery) -> ServiceResult<TaskView> {
        let tasks = self.list()?;
        Ok(build_view(&tasks, query, local_today()))
    }

    fn load(&self, event: &'static str, id: Option<TaskId>) -> ServiceResult<Vec<Task>> {
        self.gateway.load_all().map_err(|err| {
            self.log_failure(event, id, &err);
            err.into()
        })
    }

    fn save(&self, event: &'static str, id: Option<TaskId>, tasks: &[Task]) -> ServiceResult<()> {
        self.gateway.save_all(tasks).map_err(|err| {
            self.log_failure(event, id, &err);
            err.into()
        })
    }

    fn log_failure(&self, event: &'static str, id: Option<TaskId>, err: &GatewayError) {
        let task_id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
        warn!(
            "event={event} module=service status=error task_id={task_id} backend={} error_code=storage_unavailable error={err}",
            self.gateway.backend_name()
        );
    }
}

fn position_of(tasks: &[Task], id: TaskId) -> ServiceResult<usize> {
    tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or(TaskServiceError::NotFound(id))
}

#[cfg(test)]
mod tests {
    use super::{TaskService, TaskServiceError};
    use crate::model::task::{TaskDraft, TaskPatch};
    use crate::store::memory::MemoryGateway;

    #[test]
    fn empty_patch_returns_record_without_writing() {
        let service = TaskService::new(MemoryGateway::new());
        let task = service.create(&TaskDraft::new("read")).unwrap();

        let same = service.update(task.id, &TaskPatch::default()).unwrap();
        assert_eq!(same, task);
    }

    #[test]
    fn error_codes_are_stable() {
        let service = TaskService::new(MemoryGateway::new());
        let err = service.create(&TaskDraft::new("   ")).unwrap_err();
        assert_eq!(err.code(), "validation_failed");
        assert_eq!(err.reasons(), ["Task title is required".to_string()]);

        let missing = service.toggle_completion(uuid::Uuid::new_v4()).unwrap_err();
        assert!(matches!(missing, TaskServiceError::NotFound(_)));
        assert_eq!(missing.code(), "not_found");
    }
}
