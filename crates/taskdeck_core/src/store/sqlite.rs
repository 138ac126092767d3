//! SQLite table-backed task store.
//!
//! # Responsibility
//! - Map the task collection onto the `tasks` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `save_all` runs delete + insert inside one transaction.
//! - The `store_meta.seeded` marker distinguishes a never-used table (seeded
//!   on first load) from one the user emptied (loads as empty).
//! - Rows that fail to parse are reported as `InvalidData`, never skipped.

use super::seed::default_seed_tasks;
use super::{validate_collection, GatewayError, GatewayResult, TaskGateway};
use crate::model::task::{parse_due_date, Priority, Task};
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    due_date,
    priority,
    completed,
    created_at
FROM tasks
ORDER BY created_at ASC, id ASC";

const SEEDED_KEY: &str = "seeded";

/// Task store over a migrated SQLite connection.
pub struct SqliteTaskGateway<'conn> {
    conn: &'conn Connection,
    seed: Vec<Task>,
}

impl<'conn> SqliteTaskGateway<'conn> {
    /// Creates a gateway over a connection returned by [`crate::db::open_db`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            seed: default_seed_tasks(),
        }
    }

    /// Replaces the first-use seed set.
    pub fn with_seed(mut self, seed: Vec<Task>) -> Self {
        self.seed = seed;
        self
    }

    fn is_seeded(&self) -> GatewayResult<bool> {
        let marker = self
            .conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1;",
                [SEEDED_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(marker.is_some())
    }

    fn read_rows(&self) -> GatewayResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(TASK_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl TaskGateway for SqliteTaskGateway<'_> {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn load_all(&self) -> GatewayResult<Vec<Task>> {
        if !self.is_seeded()? {
            info!(
                "event=store_init module=store backend=sqlite status=start seed_count={}",
                self.seed.len()
            );
            self.save_all(&self.seed)?;
        }

        let tasks = self.read_rows()?;
        validate_collection(&tasks)?;
        info!(
            "event=store_load module=store backend=sqlite status=ok count={}",
            tasks.len()
        );
        Ok(tasks)
    }

    fn save_all(&self, tasks: &[Task]) -> GatewayResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM tasks;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO tasks (
                    id,
                    title,
                    description,
                    due_date,
                    priority,
                    completed,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            )?;
            for task in tasks {
                insert.execute(params![
                    task.id.to_string(),
                    task.title.as_str(),
                    task.description.as_deref(),
                    task.due_date.map(|date| date.format("%Y-%m-%d").to_string()),
                    task.priority.as_str(),
                    bool_to_int(task.completed),
                    format_timestamp(task.created_at),
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO store_meta (key, value) VALUES (?1, '1')
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            [SEEDED_KEY],
        )?;
        tx.commit()?;

        info!(
            "event=store_save module=store backend=sqlite status=ok count={}",
            tasks.len()
        );
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> GatewayResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        GatewayError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).map_err(|_| {
        GatewayError::InvalidData(format!(
            "invalid priority `{priority_text}` in tasks.priority"
        ))
    })?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(parse_due_date(&value).ok_or_else(|| {
            GatewayError::InvalidData(format!("invalid due date `{value}` in tasks.due_date"))
        })?),
        None => None,
    };

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(GatewayError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    let created_text: String = row.get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_text)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            GatewayError::InvalidData(format!(
                "invalid timestamp `{created_text}` in tasks.created_at"
            ))
        })?;

    Ok(Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date,
        priority,
        completed,
        created_at,
    })
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
