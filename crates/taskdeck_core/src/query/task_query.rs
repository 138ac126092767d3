//! Status/text filtering, display ordering and due-date helpers.

use super::stats::{task_statistics, TaskStatistics};
use crate::model::task::Task;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Completion-state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Parses boundary input; blank input means [`StatusFilter::All`].
    pub fn parse(value: &str) -> Result<Self, ParseStatusFilterError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseStatusFilterError(value.to_string())),
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusFilterError(pub String);

impl Display for ParseStatusFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported status filter `{}`; expected all|active|completed",
            self.0.trim()
        )
    }
}

impl Error for ParseStatusFilterError {}

/// Filter input for [`build_view`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: StatusFilter,
    pub search_text: String,
}

impl TaskQuery {
    pub fn new(status: StatusFilter, search_text: impl Into<String>) -> Self {
        Self {
            status,
            search_text: search_text.into(),
        }
    }
}

/// Ordered, filtered tasks plus statistics for the whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub items: Vec<Task>,
    pub stats: TaskStatistics,
}

/// Keeps tasks matching `status` and, when non-blank, `search_text`.
///
/// Search is a case-insensitive substring match on title or description.
/// Input order is preserved.
pub fn filter_tasks(tasks: &[Task], status: StatusFilter, search_text: &str) -> Vec<Task> {
    let needle = search_text.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| status.matches(task))
        .filter(|task| needle.is_empty() || matches_search(task, &needle))
        .cloned()
        .collect()
}

fn matches_search(task: &Task, needle_lower: &str) -> bool {
    task.title.to_lowercase().contains(needle_lower)
        || task
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(needle_lower))
}

/// Display order: incomplete first, then priority high→low, then earliest
/// due date (undated last), then newest `created_at`.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| b.priority.rank().cmp(&a.priority.rank()))
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Returns a stably sorted copy; see [`compare_tasks`].
pub fn sort_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(compare_tasks);
    sorted
}

/// Local calendar day used for overdue checks.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// True iff the task is incomplete and its due day is before `today`.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < today)
}

/// Due date relative to today, ignoring completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueProximity {
    Past,
    Today,
    Upcoming,
}

impl DueProximity {
    /// Short label for list rows, e.g. `Overdue` or `Due Feb 15, 2024`.
    pub fn label(self, due: NaiveDate) -> String {
        match self {
            Self::Past => "Overdue".to_string(),
            Self::Today => "Due today".to_string(),
            Self::Upcoming => format!("Due {}", due.format("%b %-d, %Y")),
        }
    }
}

pub fn due_proximity(task: &Task, today: NaiveDate) -> Option<DueProximity> {
    let due = task.due_date?;
    Some(match due.cmp(&today) {
        Ordering::Less => DueProximity::Past,
        Ordering::Equal => DueProximity::Today,
        Ordering::Greater => DueProximity::Upcoming,
    })
}

/// Filter + sort for display, with statistics over the unfiltered collection.
pub fn build_view(tasks: &[Task], query: &TaskQuery, today: NaiveDate) -> TaskView {
    let filtered = filter_tasks(tasks, query.status, &query.search_text);
    TaskView {
        items: sort_tasks(&filtered),
        stats: task_statistics(tasks, today),
    }
}

#[cfg(test)]
mod tests {
    use super::{due_proximity, DueProximity, StatusFilter};
    use crate::model::task::{Task, TaskDraft};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    #[test]
    fn parse_status_filter_defaults_blank_to_all() {
        assert_eq!(StatusFilter::parse("  ").unwrap(), StatusFilter::All);
        assert_eq!(StatusFilter::parse("Active").unwrap(), StatusFilter::Active);
        assert!(StatusFilter::parse("archived").is_err());
    }

    #[test]
    fn due_proximity_labels() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap();
        let due = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let task = Task::from_draft(
            Uuid::new_v4(),
            Utc::now(),
            &TaskDraft::new("ship").with_due_date(due),
        );

        let proximity = due_proximity(&task, today).unwrap();
        assert_eq!(proximity, DueProximity::Upcoming);
        assert_eq!(proximity.label(due), "Due Feb 15, 2024");
        assert_eq!(due_proximity(&task, due), Some(DueProximity::Today));
    }
}
