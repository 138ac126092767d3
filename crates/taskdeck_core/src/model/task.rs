//! Task record, form input and partial-update shapes.
//!
//! # Responsibility
//! - Define the persisted `Task` record and its wire naming.
//! - Validate user-provided title/description input.
//! - Merge partial updates without touching immutable fields.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `title` is stored trimmed and is never empty.
//! - An empty description is stored as `None`, never as `Some("")`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a task.
pub type TaskId = Uuid;

/// Maximum title length, counted after trim.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum description length, counted after trim.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

const TITLE_REQUIRED: &str = "Task title is required";

/// Task priority. Ordinal rank drives display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Stable string used in storage and boundary APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Sort rank: high=3, medium=2, low=1.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Parses boundary input (case-insensitive, surrounding whitespace ignored).
    pub fn parse(value: &str) -> Result<Self, ParsePriorityError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(value.to_string())),
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a priority string is not one of `low|medium|high`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePriorityError(pub String);

impl Display for ParsePriorityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid priority level `{}`; expected low|medium|high",
            self.0.trim()
        )
    }
}

impl Error for ParsePriorityError {}

/// Validation failure carrying every violated rule, in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskValidationError {
    reasons: Vec<String>,
}

impl TaskValidationError {
    /// Builds an error from raw reasons. Callers should not pass an empty list.
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    /// Human-readable reasons, suitable for direct display.
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn into_reasons(self) -> Vec<String> {
        self.reasons
    }
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid task: {}", self.reasons.join("; "))
    }
}

impl Error for TaskValidationError {}

impl From<ParsePriorityError> for TaskValidationError {
    fn from(value: ParsePriorityError) -> Self {
        Self::new(vec![value.to_string()])
    }
}

/// Checks title and description length rules.
///
/// All violations are collected so a form can show them at once.
pub fn validate_task_fields(
    title: &str,
    description: Option<&str>,
) -> Result<(), TaskValidationError> {
    let mut reasons = Vec::new();

    let title_chars = title.trim().chars().count();
    if title_chars == 0 {
        reasons.push(TITLE_REQUIRED.to_string());
    } else if title_chars > TITLE_MAX_CHARS {
        reasons.push(format!(
            "Task title cannot exceed {TITLE_MAX_CHARS} characters"
        ));
    }

    if let Some(description) = description {
        if description.trim().chars().count() > DESCRIPTION_MAX_CHARS {
            reasons.push(format!(
                "Task description cannot exceed {DESCRIPTION_MAX_CHARS} characters"
            ));
        }
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(TaskValidationError::new(reasons))
    }
}

/// Canonical task record.
///
/// JSON uses camelCase names; the snake_case aliases let files written by
/// table-backed deployments load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, alias = "due_date", with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a new incomplete task from validated form input.
    ///
    /// Trims text fields; does not validate. Callers run
    /// [`TaskDraft::validate`] first.
    pub fn from_draft(id: TaskId, created_at: DateTime<Utc>, draft: &TaskDraft) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: normalize_description(draft.description.as_deref()),
            due_date: draft.due_date,
            priority: draft.priority.unwrap_or_default(),
            completed: false,
            created_at,
        }
    }

    /// Returns a copy with the provided patch fields applied.
    ///
    /// `id` and `created_at` are carried over unchanged.
    pub fn merged(&self, patch: &TaskPatch) -> Self {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            next.description = normalize_description(description.as_deref());
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(completed) = patch.completed {
            next.completed = completed;
        }
        next
    }

    /// Re-checks record invariants.
    ///
    /// Used on write paths and when reading persisted data back.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        let mut reasons = Vec::new();
        if self.id.is_nil() {
            reasons.push("Task id must not be nil".to_string());
        }
        if let Err(err) = validate_task_fields(&self.title, self.description.as_deref()) {
            reasons.extend(err.into_reasons());
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(TaskValidationError::new(reasons))
        }
    }
}

/// Create-form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// `None` falls back to [`Priority::Medium`].
    pub priority: Option<Priority>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_task_fields(&self.title, self.description.as_deref())
    }
}

/// Partial update. `None` means "leave unchanged".
///
/// Clearable fields use a nested option: `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.completed.is_none()
    }
}

fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_description(value.as_deref()))
}

/// `YYYY-MM-DD` on write; also accepts RFC 3339 timestamps on read.
mod due_date_format {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const DATE_FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        super::parse_due_date(trimmed)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid due date `{trimmed}`")))
    }

    pub(super) fn parse(value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|timestamp| timestamp.date_naive())
            })
    }
}

/// Parses a due date from `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// For timestamps the calendar date in the timestamp's own offset is kept.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    due_date_format::parse(value.trim())
}

#[cfg(test)]
mod tests {
    use super::{parse_due_date, validate_task_fields, Priority, TITLE_MAX_CHARS};
    use chrono::NaiveDate;

    #[test]
    fn parse_priority_is_case_insensitive() {
        assert_eq!(Priority::parse(" HIGH ").unwrap(), Priority::High);
        assert_eq!(Priority::parse("low").unwrap(), Priority::Low);
        let err = Priority::parse("urgent").unwrap_err();
        assert!(err.to_string().contains("Invalid priority level"));
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let title = "é".repeat(TITLE_MAX_CHARS);
        assert!(validate_task_fields(&title, None).is_ok());
    }

    #[test]
    fn parse_due_date_accepts_plain_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(parse_due_date("2024-02-15"), Some(expected));
        assert_eq!(parse_due_date("2024-02-15T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_due_date("next week"), None);
    }
}
