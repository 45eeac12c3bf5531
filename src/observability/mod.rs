//! AI observability subsystem
//!
//! Structured, queryable logging for LLM prompts, responses, tool calls and
//! evaluations:
//! - **Events**: closed category/severity taxonomy, one immutable record per call
//! - **Store**: a single append-only SQLite table with four indexes
//! - **Correlation**: ambient, per-task conversation id
//! - **Query**: filtering, pagination and aggregate statistics
//!
//! ## Architecture
//!
//! ```text
//! AiLogger (gating, truncation, correlation)
//!     ↓
//! LogStore (SQLite, append-only)
//!     ↑
//! LogStorage (read-only queries and statistics)
//! ```

pub mod context;
pub mod database;
pub mod event;
pub mod logger;
pub mod query;

// Re-export public types
pub use context::ConversationGuard;
pub use database::{LogStore, StoreOptions};
pub use event::{Category, EvaluationScores, LogEvent, Metadata, Severity};
pub use logger::{
    ai_logger, set_ai_logger, truncate_text, AiLogger, LogRequest, LoggerConfig, DEFAULT_DB_PATH,
    DEFAULT_MAX_LOG_LENGTH,
};
pub use query::{LogFilter, LogStatistics, LogStorage, StoredLog, TimeRange};

/// Current version of the `ai_logs` schema
pub const SCHEMA_VERSION: &str = "1.0.0";
