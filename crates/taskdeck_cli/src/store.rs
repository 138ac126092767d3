//! Backend selection for one CLI invocation.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::fs;
use taskdeck_core::db::open_db;
use taskdeck_core::{
    JsonFileGateway, RetryPolicy, RetryingGateway, SqliteTaskGateway, StoreConfig, StoreKind,
    TaskGateway,
};

/// Opened backend. The SQLite variant owns the connection its gateway borrows.
pub enum OpenStore {
    JsonFile(JsonFileGateway),
    Sqlite(Connection),
}

impl OpenStore {
    /// Gateway over this store; SQLite calls retry on lock contention.
    pub fn gateway(&self) -> Box<dyn TaskGateway + '_> {
        match self {
            Self::JsonFile(gateway) => Box::new(gateway),
            Self::Sqlite(conn) => Box::new(RetryingGateway::new(
                SqliteTaskGateway::new(conn),
                RetryPolicy::default(),
            )),
        }
    }
}

pub fn open_store(config: &StoreConfig) -> Result<OpenStore> {
    match config.kind {
        StoreKind::Memory => bail!(crate::MEMORY_STORE_REJECTED),
        StoreKind::JsonFile => Ok(OpenStore::JsonFile(JsonFileGateway::new(
            config.store_path(),
        ))),
        StoreKind::Sqlite => {
            fs::create_dir_all(&config.data_dir).with_context(|| {
                format!(
                    "failed to create data directory `{}`",
                    config.data_dir.display()
                )
            })?;
            let path = config.store_path();
            let conn = open_db(&path)
                .with_context(|| format!("failed to open task database `{}`", path.display()))?;
            Ok(OpenStore::Sqlite(conn))
        }
    }
}
