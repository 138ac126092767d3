//! `taskdeck` command-line front end.
//!
//! # Responsibility
//! - Parse commands and map them onto `TaskService` calls.
//! - Select the persistence backend from flags, falling back to `TASKDECK_*`
//!   environment variables.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use store::open_store;
use taskdeck_core::{
    default_log_level, due_proximity, init_logging, local_today, parse_due_date, Priority,
    StatusFilter, StoreConfig, StoreKind, Task, TaskDraft, TaskGateway, TaskPatch, TaskQuery,
    TaskService, TaskServiceError,
};
use uuid::Uuid;

mod store;

/// Each invocation is a new process, so a volatile store would lose every write.
const MEMORY_STORE_REJECTED: &str =
    "the memory store does not persist between commands; use json or sqlite";

/// Personal task tracker
#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Track personal tasks from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// Storage backend: json or sqlite (overrides TASKDECK_STORE)
    #[arg(long, global = true, value_parser = parse_store_kind)]
    store: Option<StoreKind>,

    /// Directory holding the store file (overrides TASKDECK_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Write rolling logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level used with --log-dir
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tasks, sorted for display
    List {
        /// all, active or completed
        #[arg(long, default_value = "all", value_parser = parse_status)]
        status: StatusFilter,

        /// Case-insensitive text matched against title and description
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Create a task
    Add {
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Due date as YYYY-MM-DD
        #[arg(long, value_parser = parse_due)]
        due: Option<NaiveDate>,

        /// low, medium or high
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },

    /// Change fields of an existing task
    ///
    /// Pass an empty string to --description or --due to clear it.
    Edit {
        id: Uuid,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        due: Option<String>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,

        #[arg(long)]
        completed: Option<bool>,
    },

    /// Flip a task between active and completed
    Toggle { id: Uuid },

    /// Delete a task permanently
    Rm { id: Uuid },

    /// Print collection counters
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = log_level(&cli);
        let log_dir = absolute(log_dir)?;
        init_logging(level, &log_dir.to_string_lossy())
            .context("failed to initialize logging")?;
    }

    let config = store_config(&cli)?;
    info!(
        "event=cli_start module=cli status=ok store={}",
        config.kind.as_str()
    );

    let store = open_store(&config)?;
    let service = TaskService::new(store.gateway());
    run(&service, cli.command)
}

fn log_level(cli: &Cli) -> &str {
    cli.log_level.as_deref().unwrap_or(default_log_level())
}

fn store_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = StoreConfig::from_env().context("invalid store configuration")?;
    if let Some(kind) = cli.store {
        config.kind = kind;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if config.kind == StoreKind::Memory {
        bail!("{MEMORY_STORE_REJECTED}");
    }
    Ok(config)
}

fn run<G: TaskGateway>(service: &TaskService<G>, command: Command) -> Result<()> {
    match command {
        Command::List { status, search } => {
            let view = service
                .view(&TaskQuery::new(status, search))
                .map_err(describe)?;
            if view.items.is_empty() {
                println!("No tasks.");
            }
            let today = local_today();
            for task in &view.items {
                println!("{}", render_row(task, today));
            }
        }
        Command::Add {
            title,
            description,
            due,
            priority,
        } => {
            let draft = TaskDraft {
                title,
                description,
                due_date: due,
                priority,
            };
            let task = service.create(&draft).map_err(describe)?;
            println!("Created {}", task.id);
        }
        Command::Edit {
            id,
            title,
            description,
            due,
            priority,
            completed,
        } => {
            let patch = TaskPatch {
                title,
                description: description.map(clearable),
                due_date: due.as_deref().map(parse_clearable_due).transpose()?,
                priority,
                completed,
            };
            if patch.is_empty() {
                bail!("nothing to change; pass at least one field flag");
            }
            let task = service.update(id, &patch).map_err(describe)?;
            println!("{}", render_row(&task, local_today()));
        }
        Command::Toggle { id } => {
            let task = service.toggle_completion(id).map_err(describe)?;
            println!("{}", render_row(&task, local_today()));
        }
        Command::Rm { id } => {
            let id = service.delete(id).map_err(describe)?;
            println!("Deleted {id}");
        }
        Command::Stats => {
            let stats = service.view(&TaskQuery::default()).map_err(describe)?.stats;
            println!("total:     {}", stats.total);
            println!("active:    {}", stats.active);
            println!("completed: {}", stats.completed);
            println!("overdue:   {}", stats.overdue);
            println!(
                "priority:  high={} medium={} low={}",
                stats.high_priority, stats.medium_priority, stats.low_priority
            );
        }
    }
    Ok(())
}

fn render_row(task: &Task, today: NaiveDate) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let mut row = format!(
        "{check} {id}  {priority:<6}  {title}",
        id = task.id,
        priority = task.priority.label(),
        title = task.title
    );
    if let (Some(due), Some(proximity)) = (task.due_date, due_proximity(task, today)) {
        row.push_str(&format!("  ({})", proximity.label(due)));
    }
    row
}

/// Flattens validation reasons into one readable error.
fn describe(err: TaskServiceError) -> anyhow::Error {
    match err {
        TaskServiceError::Validation(err) => anyhow::anyhow!("{}", err.reasons().join("\n")),
        other => anyhow::Error::new(other),
    }
}

fn parse_store_kind(value: &str) -> Result<StoreKind, String> {
    match StoreKind::parse(value).map_err(|err| err.to_string())? {
        StoreKind::Memory => Err(MEMORY_STORE_REJECTED.to_string()),
        kind => Ok(kind),
    }
}

fn parse_status(value: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse(value).map_err(|err| err.to_string())
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::parse(value).map_err(|err| err.to_string())
}

fn parse_due(value: &str) -> Result<NaiveDate, String> {
    parse_due_date(value).ok_or_else(|| format!("invalid due date `{value}`; expected YYYY-MM-DD"))
}

fn clearable(value: String) -> Option<String> {
    Some(value).filter(|value| !value.trim().is_empty())
}

fn parse_clearable_due(value: &str) -> Result<Option<NaiveDate>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_due(value).map(Some).map_err(anyhow::Error::msg)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::{log_level, parse_clearable_due, render_row, store_config, Cli, Command};
    use chrono::{NaiveDate, Utc};
    use clap::Parser;
    use taskdeck_core::{default_log_level, Priority, StatusFilter, StoreKind, Task, TaskDraft};
    use uuid::Uuid;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "taskdeck", "list", "--status", "active", "--store", "sqlite", "--search", "milk",
        ])
        .unwrap();
        assert_eq!(cli.store, Some(StoreKind::Sqlite));
        assert!(matches!(
            cli.command,
            Command::List { status: StatusFilter::Active, ref search } if search == "milk"
        ));
    }

    #[test]
    fn log_level_falls_back_to_build_default() {
        let cli = Cli::try_parse_from(["taskdeck", "stats"]).unwrap();
        assert_eq!(log_level(&cli), default_log_level());

        let cli = Cli::try_parse_from(["taskdeck", "stats", "--log-level", "warn"]).unwrap();
        assert_eq!(log_level(&cli), "warn");
    }

    #[test]
    fn memory_store_is_rejected() {
        let err = Cli::try_parse_from(["taskdeck", "list", "--store", "memory"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("does not persist"));

        let cli = Cli::try_parse_from(["taskdeck", "list", "--store", "json"]).unwrap();
        assert_eq!(store_config(&cli).unwrap().kind, StoreKind::JsonFile);
    }

    #[test]
    fn rejects_unknown_priority_and_bad_due_date() {
        assert!(Cli::try_parse_from(["taskdeck", "add", "x", "--priority", "urgent"]).is_err());
        assert!(Cli::try_parse_from(["taskdeck", "add", "x", "--due", "tomorrow"]).is_err());
    }

    #[test]
    fn empty_due_clears_the_date() {
        assert_eq!(parse_clearable_due("").unwrap(), None);
        assert_eq!(
            parse_clearable_due("2024-02-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 15)
        );
        assert!(parse_clearable_due("soon").is_err());
    }

    #[test]
    fn row_shows_completion_and_due_label() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap();
        let mut task = Task::from_draft(
            Uuid::new_v4(),
            Utc::now(),
            &TaskDraft::new("Review PRs").with_due_date(today.pred_opt().unwrap()),
        );
        assert!(render_row(&task, today).starts_with("[ ]"));
        assert!(render_row(&task, today).ends_with("(Overdue)"));

        task.completed = true;
        assert!(render_row(&task, today).starts_with("[x]"));
    }

    #[test]
    fn row_shows_priority_label() {
        let task = Task::from_draft(
            Uuid::new_v4(),
            Utc::now(),
            &TaskDraft::new("Ship it").with_priority(Priority::High),
        );
        let today = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap();
        assert!(render_row(&task, today).contains("  High    Ship it"));
    }
}
