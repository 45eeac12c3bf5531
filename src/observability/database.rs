//! SQLite store for AI log events
//!
//! This module owns the single `ai_logs` table:
//! - Idempotent schema creation (CREATE IF NOT EXISTS)
//! - WAL mode and a busy timeout so concurrent writers wait on SQLite's lock
//! - Append-only inserts, no upsert and no deletes
//!
//! Read operations live in [`super::query`].

use super::event::{format_timestamp, LogEvent};
use crate::error::{ObservabilityError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the events table
pub const TABLE_NAME: &str = "ai_logs";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS ai_logs (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    conversation_id TEXT,
    category TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL,
    metadata TEXT NOT NULL,
    model_name TEXT,
    prompt_text TEXT,
    response_text TEXT,
    token_count_input INTEGER,
    token_count_output INTEGER,
    latency_ms REAL,
    cost_usd REAL,
    tool_name TEXT,
    evaluation_scores TEXT
)";

const CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_conversation_id ON ai_logs(conversation_id)",
    "CREATE INDEX IF NOT EXISTS idx_category ON ai_logs(category)",
    "CREATE INDEX IF NOT EXISTS idx_severity ON ai_logs(severity)",
    "CREATE INDEX IF NOT EXISTS idx_timestamp ON ai_logs(timestamp)",
];

/// How a store treats a database file that does not exist yet
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Create the file and schema when missing (default), or fail with NotFound
    pub create_if_missing: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
        }
    }
}

/// Durable log store handle
///
/// Cheap to share behind an `Arc`; several independent stores may point at the
/// same file, SQLite serializes their writers.
pub struct LogStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl LogStore {
    /// Open (or create) the store at `path` with default options
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, StoreOptions::default()).await
    }

    /// Open the store at `path`
    ///
    /// With `create_if_missing = false` a missing file is reported as
    /// [`ObservabilityError::NotFound`] before any connection is attempted.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let options = StoreOptions { create_if_missing: false };
    /// let store = LogStore::open_with("./ai_logs.db", options).await?;
    /// ```
    pub async fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !options.create_if_missing && !path.exists() {
            return Err(ObservabilityError::NotFound(path));
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(options.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal) // Concurrent readers alongside one writer
            .busy_timeout(Duration::from_secs(30)) // Wait on SQLite's write lock instead of failing
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(5) // SQLite allows a single writer anyway
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_options)
            .await?;

        let store = Self { pool, path };
        store.ensure_schema().await?;

        Ok(store)
    }

    /// Create the table and its four indexes if absent
    ///
    /// Safe to call repeatedly and from several stores on the same file.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;

        for statement in CREATE_INDEXES {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::debug!(path = %self.path.display(), "AI log schema ready");
        Ok(())
    }

    /// Append one event
    ///
    /// Every call creates a new row; the only uniqueness is the event id.
    /// Failures are returned to the caller, nothing is retried.
    pub async fn insert(&self, event: &LogEvent) -> Result<()> {
        let metadata = serde_json::to_string(&event.metadata)?;
        let evaluation_scores = match &event.evaluation_scores {
            Some(scores) if !scores.is_empty() => Some(serde_json::to_string(scores)?),
            _ => None,
        };

        sqlx::query(
            "INSERT INTO ai_logs (
                id, timestamp, conversation_id, category, severity, message,
                metadata, model_name, prompt_text, response_text,
                token_count_input, token_count_output, latency_ms, cost_usd,
                tool_name, evaluation_scores
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.id.to_string())
        .bind(format_timestamp(&event.timestamp))
        .bind(&event.conversation_id)
        .bind(event.category.as_str())
        .bind(event.severity.as_str())
        .bind(&event.message)
        .bind(metadata)
        .bind(&event.model_name)
        .bind(&event.prompt_text)
        .bind(&event.response_text)
        .bind(event.token_count_input)
        .bind(event.token_count_output)
        .bind(event.latency_ms)
        .bind(event.cost_usd)
        .bind(&event.tool_name)
        .bind(evaluation_scores)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the underlying connection pool (for advanced usage)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
