//! Flat-file JSON task store.
//!
//! # Invariants
//! - The file holds one JSON array of tasks, pretty-printed.
//! - Writes go to a temp file in the target directory and are renamed into
//!   place, so readers never observe a half-written array.
//! - A missing file is created from the seed set on first load; an empty
//!   (zero-byte or whitespace) file loads as an empty collection.

use super::seed::default_seed_tasks;
use super::{validate_collection, GatewayError, GatewayResult, TaskGateway};
use crate::model::task::Task;
use log::{error, info};
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Task store persisted as a single JSON document.
pub struct JsonFileGateway {
    path: PathBuf,
    seed: Vec<Task>,
}

impl JsonFileGateway {
    /// Creates a gateway that seeds a missing file with the default demo tasks.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: default_seed_tasks(),
        }
    }

    /// Replaces the first-use seed set.
    pub fn with_seed(mut self, seed: Vec<Task>) -> Self {
        self.seed = seed;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn initialize(&self) -> GatewayResult<Vec<Task>> {
        info!(
            "event=store_init module=store backend=json_file status=start seed_count={}",
            self.seed.len()
        );
        self.save_all(&self.seed)?;
        Ok(self.seed.clone())
    }

    fn write_atomically(&self, tasks: &[Task]) -> GatewayResult<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|err| GatewayError::io(&dir, err))?;

        let temp = NamedTempFile::new_in(&dir).map_err(|err| GatewayError::io(&dir, err))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, tasks)?;
            writer
                .write_all(b"\n")
                .and_then(|()| writer.flush())
                .map_err(|err| GatewayError::io(temp.path(), err))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|err| GatewayError::io(temp.path(), err))?;
        temp.persist(&self.path)
            .map_err(|err| GatewayError::io(&self.path, err.error))?;
        Ok(())
    }
}

impl TaskGateway for JsonFileGateway {
    fn backend_name(&self) -> &'static str {
        "json_file"
    }

    fn load_all(&self) -> GatewayResult<Vec<Task>> {
        let started_at = Instant::now();
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return self.initialize(),
            Err(err) => {
                error!(
                    "event=store_load module=store backend=json_file status=error error_code=read_failed error={err}"
                );
                return Err(GatewayError::io(&self.path, err));
            }
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = serde_json::from_str(&raw).map_err(|err| {
            error!(
                "event=store_load module=store backend=json_file status=error error_code=parse_failed error={err}"
            );
            GatewayError::from(err)
        })?;
        validate_collection(&tasks)?;

        info!(
            "event=store_load module=store backend=json_file status=ok count={} duration_ms={}",
            tasks.len(),
            started_at.elapsed().as_millis()
        );
        Ok(tasks)
    }

    fn save_all(&self, tasks: &[Task]) -> GatewayResult<()> {
        let started_at = Instant::now();
        match self.write_atomically(tasks) {
            Ok(()) => {
                info!(
                    "event=store_save module=store backend=json_file status=ok count={} duration_ms={}",
                    tasks.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=store backend=json_file status=error error_code=write_failed error={err}"
                );
                Err(err)
            }
        }
    }
}
