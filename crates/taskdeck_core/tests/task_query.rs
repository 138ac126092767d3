use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use taskdeck_core::{
    build_view, filter_tasks, is_overdue, sort_tasks, task_statistics, Priority, StatusFilter,
    Task, TaskDraft, TaskQuery, TaskStatistics,
};
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 12).unwrap()
}

fn created(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

fn task(
    title: &str,
    priority: Priority,
    due: Option<NaiveDate>,
    completed: bool,
    day: u32,
) -> Task {
    let mut draft = TaskDraft::new(title).with_priority(priority);
    draft.due_date = due;
    let mut task = Task::from_draft(Uuid::new_v4(), created(day), &draft);
    task.completed = completed;
    task
}

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.title.as_str()).collect()
}

fn fixture() -> Vec<Task> {
    let feb = |day| NaiveDate::from_ymd_opt(2024, 2, day);
    let mut docs = task("Write docs", Priority::High, feb(15), false, 20);
    docs.description = Some("Comprehensive DOCUMENTATION".to_string());
    vec![
        docs,
        task("Review PRs", Priority::Medium, feb(10), false, 21),
        task("Update deps", Priority::Low, None, true, 18),
        task("Plan meeting", Priority::Medium, feb(12), false, 22),
        task("Fix build", Priority::High, None, false, 23),
        task("Archive notes", Priority::High, feb(1), true, 19),
    ]
}

#[test]
fn status_filter_partitions_by_completion() {
    let tasks = fixture();

    let active = filter_tasks(&tasks, StatusFilter::Active, "");
    assert!(active.iter().all(|task| !task.completed));
    assert_eq!(active.len(), 4);

    let completed = filter_tasks(&tasks, StatusFilter::Completed, "");
    assert_eq!(titles(&completed), vec!["Update deps", "Archive notes"]);
}

#[test]
fn all_with_blank_search_returns_collection_unchanged() {
    let tasks = fixture();
    assert_eq!(filter_tasks(&tasks, StatusFilter::All, ""), tasks);
    assert_eq!(filter_tasks(&tasks, StatusFilter::All, "   \t"), tasks);
}

#[test]
fn search_is_trimmed_case_insensitive_over_title_and_description() {
    let tasks = fixture();

    let by_description = filter_tasks(&tasks, StatusFilter::All, "  documentation ");
    assert_eq!(titles(&by_description), vec!["Write docs"]);

    let by_title = filter_tasks(&tasks, StatusFilter::All, "pLaN");
    assert_eq!(titles(&by_title), vec!["Plan meeting"]);

    assert!(filter_tasks(&tasks, StatusFilter::All, "nothing matches").is_empty());
}

#[test]
fn status_and_search_filters_commute() {
    let tasks = fixture();
    for status in [StatusFilter::All, StatusFilter::Active, StatusFilter::Completed] {
        let status_first = filter_tasks(
            &filter_tasks(&tasks, status, ""),
            StatusFilter::All,
            "e",
        );
        let search_first = filter_tasks(
            &filter_tasks(&tasks, StatusFilter::All, "e"),
            status,
            "",
        );
        assert_eq!(status_first, search_first);
        assert_eq!(filter_tasks(&tasks, status, "e"), status_first);
    }
}

#[test]
fn sort_orders_by_completion_priority_due_date_then_newest() {
    let sorted = sort_tasks(&fixture());
    assert_eq!(
        titles(&sorted),
        vec![
            // incomplete, high: dated before undated
            "Write docs",
            "Fix build",
            // incomplete, medium: earliest due first
            "Review PRs",
            "Plan meeting",
            // completed, high before low
            "Archive notes",
            "Update deps",
        ]
    );
}

#[test]
fn sort_breaks_full_ties_by_newest_created_at() {
    let tasks = vec![
        task("older", Priority::Low, None, false, 1),
        task("newer", Priority::Low, None, false, 2),
    ];
    assert_eq!(titles(&sort_tasks(&tasks)), vec!["newer", "older"]);
}

#[test]
fn sort_is_idempotent_and_does_not_mutate_input() {
    let tasks = fixture();
    let snapshot = tasks.clone();
    let once = sort_tasks(&tasks);
    let twice = sort_tasks(&once);
    assert_eq!(once, twice);
    assert_eq!(tasks, snapshot);
}

#[test]
fn overdue_requires_past_due_date_and_incomplete() {
    let yesterday = today() - Duration::days(1);
    let mut overdue = task("late", Priority::Medium, Some(yesterday), false, 1);
    assert!(is_overdue(&overdue, today()));

    overdue.completed = true;
    assert!(!is_overdue(&overdue, today()));

    let due_today = task("today", Priority::Medium, Some(today()), false, 1);
    assert!(!is_overdue(&due_today, today()));

    let undated = task("whenever", Priority::Medium, None, false, 1);
    assert!(!is_overdue(&undated, today()));
}

#[test]
fn statistics_count_every_dimension() {
    let stats = task_statistics(&fixture(), today());
    assert_eq!(
        stats,
        TaskStatistics {
            total: 6,
            active: 4,
            completed: 2,
            // "Review PRs" (Feb 10) only; "Archive notes" is completed.
            overdue: 1,
            high_priority: 3,
            medium_priority: 2,
            low_priority: 1,
        }
    );
    assert_eq!(stats.active + stats.completed, stats.total);
    assert_eq!(task_statistics(&[], today()), TaskStatistics::default());
}

#[test]
fn view_filters_and_sorts_items_but_counts_whole_collection() {
    let tasks = fixture();
    let view = build_view(&tasks, &TaskQuery::new(StatusFilter::Completed, ""), today());

    assert_eq!(titles(&view.items), vec!["Archive notes", "Update deps"]);
    assert_eq!(view.stats.total, 6);
    assert_eq!(view.stats.active + view.stats.completed, view.stats.total);
}

#[test]
fn statistics_serialize_with_camel_case_names() {
    let json = serde_json::to_value(task_statistics(&fixture(), today())).unwrap();
    assert_eq!(json["highPriority"], 3);
    assert_eq!(json["overdue"], 1);
}
