//! Command implementations for the CLI
//!
//! - logs: Query events and show conversation timelines
//! - stats: Aggregate statistics, conversation and model listings
//! - record: Emit one event through the default logger

pub mod logs;
pub mod record;
pub mod stats;

use ai_observability::config;
use ai_observability::observability::LogStorage;
use anyhow::Result;
use std::path::PathBuf;

/// Resolve the database path from the `--db` flag or configuration
pub fn resolve_db_path(db: Option<PathBuf>) -> Result<PathBuf> {
    match db {
        Some(path) => Ok(path),
        None => Ok(PathBuf::from(config::load_config()?.db_path)),
    }
}

/// Open the log database for reading; never creates it
pub async fn open_storage(db: Option<PathBuf>) -> Result<LogStorage> {
    let path = resolve_db_path(db)?;
    let storage = LogStorage::open(&path, false).await?;
    Ok(storage)
}
