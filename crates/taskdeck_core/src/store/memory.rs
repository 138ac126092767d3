//! In-process task store.
//!
//! Backs ephemeral sessions and serves as the test double for the service.

use super::{GatewayResult, TaskGateway};
use crate::model::task::Task;
use std::sync::{Mutex, MutexGuard};

/// Volatile gateway holding the collection behind a mutex.
///
/// `None` models a store that was never initialized; the first `load_all`
/// writes the seed set into it.
pub struct MemoryGateway {
    tasks: Mutex<Option<Vec<Task>>>,
    seed: Vec<Task>,
}

impl MemoryGateway {
    /// Existing, empty store.
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    /// Existing store holding `tasks`.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(Some(tasks)),
            seed: Vec::new(),
        }
    }

    /// Store that does not exist yet and will be created from `seed`.
    pub fn uninitialized(seed: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(None),
            seed,
        }
    }

    /// Current contents without triggering initialization.
    pub fn snapshot(&self) -> Option<Vec<Task>> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<Task>>> {
        // A poisoned lock still guards a whole collection: writes swap the vector.
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGateway for MemoryGateway {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn load_all(&self) -> GatewayResult<Vec<Task>> {
        let mut guard = self.lock();
        let tasks = guard.get_or_insert_with(|| self.seed.clone());
        Ok(tasks.clone())
    }

    fn save_all(&self, tasks: &[Task]) -> GatewayResult<()> {
        *self.lock() = Some(tasks.to_vec());
        Ok(())
    }
}
