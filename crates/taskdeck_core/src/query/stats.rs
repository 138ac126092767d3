//! Collection statistics.

use super::task_query::is_overdue;
use crate::model::task::{Priority, Task};
use chrono::NaiveDate;
use serde::Serialize;

/// Counts over one collection. `active + completed == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
}

/// Single pass over `tasks`.
pub fn task_statistics(tasks: &[Task], today: NaiveDate) -> TaskStatistics {
    tasks
        .iter()
        .fold(TaskStatistics::default(), |mut stats, task| {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            } else {
                stats.active += 1;
            }
            if is_overdue(task, today) {
                stats.overdue += 1;
            }
            match task.priority {
                Priority::High => stats.high_priority += 1,
                Priority::Medium => stats.medium_priority += 1,
                Priority::Low => stats.low_priority += 1,
            }
            stats
        })
}
