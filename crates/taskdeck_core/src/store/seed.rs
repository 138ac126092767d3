//! Demo tasks written into a store on its first use.

use crate::model::task::{Priority, Task};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

struct SeedTask {
    title: &'static str,
    description: &'static str,
    due_date: Option<(i32, u32, u32)>,
    priority: Priority,
    completed: bool,
    created_at: (i32, u32, u32),
}

const SEED_TASKS: &[SeedTask] = &[
    SeedTask {
        title: "Complete project documentation",
        description: "Write comprehensive documentation for the new feature",
        due_date: Some((2024, 2, 15)),
        priority: Priority::High,
        completed: false,
        created_at: (2024, 1, 20),
    },
    SeedTask {
        title: "Review pull requests",
        description: "Review and merge pending pull requests from team members",
        due_date: Some((2024, 2, 10)),
        priority: Priority::Medium,
        completed: false,
        created_at: (2024, 1, 21),
    },
    SeedTask {
        title: "Update dependencies",
        description: "Update all packages to latest versions",
        due_date: None,
        priority: Priority::Low,
        completed: true,
        created_at: (2024, 1, 18),
    },
    SeedTask {
        title: "Plan team meeting",
        description: "Schedule and prepare agenda for next sprint planning",
        due_date: Some((2024, 2, 12)),
        priority: Priority::Medium,
        completed: false,
        created_at: (2024, 1, 22),
    },
];

/// Returns the default seed set with freshly generated ids.
pub fn default_seed_tasks() -> Vec<Task> {
    SEED_TASKS
        .iter()
        .map(|seed| Task {
            id: Uuid::new_v4(),
            title: seed.title.to_string(),
            description: Some(seed.description.to_string()),
            due_date: seed.due_date.map(|(y, m, d)| date(y, m, d)),
            priority: seed.priority,
            completed: seed.completed,
            created_at: utc_midnight(seed.created_at),
        })
        .collect()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn utc_midnight((year, month, day): (i32, u32, u32)) -> DateTime<Utc> {
    date(year, month, day).and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::default_seed_tasks;
    use crate::store::validate_collection;

    #[test]
    fn seed_set_is_a_valid_collection() {
        let seed = default_seed_tasks();
        assert_eq!(seed.len(), 4);
        validate_collection(&seed).unwrap();
        assert_eq!(seed.iter().filter(|task| task.completed).count(), 1);
    }
}
