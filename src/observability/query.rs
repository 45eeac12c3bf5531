//! Query API for AI log events
//!
//! Filtering, pagination and aggregation over the `ai_logs` table, plus the
//! read-only [`LogStorage`] façade used by reporting tools.

use super::database::{LogStore, StoreOptions};
use super::event::{format_timestamp, Category, EvaluationScores, Metadata, Severity};
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Default page size for `query_logs`
pub const DEFAULT_QUERY_LIMIT: usize = 1000;

/// Page size used when fetching a whole conversation
pub const CONVERSATION_QUERY_LIMIT: usize = 10_000;

/// Inclusive time window; either bound may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// From `hours` ago until now (open-ended)
    pub fn last_hours(hours: u32) -> Self {
        Self {
            start: Some(Utc::now() - Duration::hours(i64::from(hours))),
            end: None,
        }
    }

    fn push_conditions(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(start) = &self.start {
            builder.push(" AND timestamp >= ").push_bind(format_timestamp(start));
        }
        if let Some(end) = &self.end {
            builder.push(" AND timestamp <= ").push_bind(format_timestamp(end));
        }
    }
}

/// Filter for log queries (all conditions are AND-combined)
#[derive(Debug, Clone)]
pub struct LogFilter {
    pub conversation_id: Option<String>,
    pub category: Option<Category>,
    pub severity: Option<Severity>,
    pub model_name: Option<String>,
    pub time_range: TimeRange,
    pub limit: usize,
    pub offset: usize,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            conversation_id: None,
            category: None,
            severity: None,
            model_name: None,
            time_range: TimeRange::default(),
            limit: DEFAULT_QUERY_LIMIT,
            offset: 0,
        }
    }
}

impl LogFilter {
    pub fn for_conversation(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            ..Default::default()
        }
    }
}

/// An event as read back from storage
///
/// Category and severity are kept as stored text so that rows written by other
/// tools never fail a read; JSON columns degrade to empty/absent when malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLog {
    pub id: String,
    pub timestamp: String,
    pub conversation_id: Option<String>,
    pub category: String,
    pub severity: String,
    pub message: String,
    pub metadata: Metadata,
    pub model_name: Option<String>,
    pub prompt_text: Option<String>,
    pub response_text: Option<String>,
    pub token_count_input: Option<i64>,
    pub token_count_output: Option<i64>,
    pub latency_ms: Option<f64>,
    pub cost_usd: Option<f64>,
    pub tool_name: Option<String>,
    pub evaluation_scores: Option<EvaluationScores>,
}

impl StoredLog {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let id: String = row.try_get("id")?;
        let metadata: Option<String> = row.try_get("metadata")?;
        let evaluation_scores: Option<String> = row.try_get("evaluation_scores")?;

        Ok(Self {
            metadata: decode_metadata(&id, metadata.as_deref()),
            evaluation_scores: decode_scores(&id, evaluation_scores.as_deref()),
            id,
            timestamp: row.try_get("timestamp")?,
            conversation_id: row.try_get("conversation_id")?,
            category: row.try_get("category")?,
            severity: row.try_get("severity")?,
            message: row.try_get("message")?,
            model_name: row.try_get("model_name")?,
            prompt_text: row.try_get("prompt_text")?,
            response_text: row.try_get("response_text")?,
            token_count_input: row.try_get("token_count_input")?,
            token_count_output: row.try_get("token_count_output")?,
            latency_ms: row.try_get("latency_ms")?,
            cost_usd: row.try_get("cost_usd")?,
            tool_name: row.try_get("tool_name")?,
        })
    }

    /// Typed category, if the stored text is one of the known categories
    pub fn category(&self) -> Option<Category> {
        self.category.parse().ok()
    }

    /// Typed severity, if the stored text is one of the known levels
    pub fn severity(&self) -> Option<Severity> {
        self.severity.parse().ok()
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        super::event::parse_timestamp(&self.timestamp)
    }
}

fn decode_metadata(id: &str, raw: Option<&str>) -> Metadata {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Metadata::new();
    };
    match serde_json::from_str::<Metadata>(raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(
                log_id = %id,
                error = %e,
                "Malformed metadata JSON, using empty mapping"
            );
            Metadata::new()
        }
    }
}

fn decode_scores(id: &str, raw: Option<&str>) -> Option<EvaluationScores> {
    let raw = raw.filter(|s| !s.is_empty())?;
    match serde_json::from_str::<EvaluationScores>(raw) {
        Ok(scores) => Some(scores),
        Err(e) => {
            tracing::warn!(log_id = %id, error = %e, "Malformed evaluation_scores JSON, ignoring");
            None
        }
    }
}

/// Aggregate statistics over a time window
///
/// Numeric aggregates are zero, never absent, when no row qualifies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogStatistics {
    pub total_logs: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_severity: BTreeMap<String, u64>,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_cost_usd: f64,
    pub avg_latency_ms: f64,
}

impl LogStore {
    /// Query events matching `filter`, newest first
    ///
    /// # Example
    ///
    /// ```ignore
    /// let filter = LogFilter {
    ///     category: Some(Category::Error),
    ///     time_range: TimeRange::last_hours(1),
    ///     limit: 100,
    ///     ..Default::default()
    /// };
    /// let logs = store.query(&filter).await?;
    /// ```
    pub async fn query(&self, filter: &LogFilter) -> Result<Vec<StoredLog>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM ai_logs WHERE 1=1");

        if let Some(conversation_id) = &filter.conversation_id {
            builder.push(" AND conversation_id = ").push_bind(conversation_id.clone());
        }
        if let Some(category) = filter.category {
            builder.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(severity) = filter.severity {
            builder.push(" AND severity = ").push_bind(severity.as_str());
        }
        if let Some(model_name) = &filter.model_name {
            builder.push(" AND model_name = ").push_bind(model_name.clone());
        }
        filter.time_range.push_conditions(&mut builder);

        // rowid breaks ties between events stamped in the same microsecond
        builder
            .push(" ORDER BY timestamp DESC, rowid DESC LIMIT ")
            .push_bind(to_i64(filter.limit))
            .push(" OFFSET ")
            .push_bind(to_i64(filter.offset));

        let rows = builder.build().fetch_all(self.pool()).await?;
        rows.iter().map(StoredLog::from_row).collect()
    }

    /// Aggregate counts, token sums, cost and latency over `range`
    ///
    /// Token/cost/latency aggregates only consider rows with an input token
    /// count; the total and grouped counts consider every row in range.
    pub async fn aggregate(&self, range: &TimeRange) -> Result<LogStatistics> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ai_logs WHERE 1=1");
        range.push_conditions(&mut builder);
        let total_logs: i64 = builder.build_query_scalar().fetch_one(self.pool()).await?;

        let by_category = self.count_grouped_by("category", range).await?;
        let by_severity = self.count_grouped_by("severity", range).await?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT
                SUM(token_count_input) AS total_input_tokens,
                SUM(token_count_output) AS total_output_tokens,
                SUM(cost_usd) AS total_cost,
                AVG(latency_ms) AS avg_latency
             FROM ai_logs
             WHERE token_count_input IS NOT NULL",
        );
        range.push_conditions(&mut builder);
        let row = builder.build().fetch_one(self.pool()).await?;

        Ok(LogStatistics {
            total_logs: total_logs.max(0) as u64,
            by_category,
            by_severity,
            total_input_tokens: row.try_get::<Option<i64>, _>("total_input_tokens")?.unwrap_or(0),
            total_output_tokens: row.try_get::<Option<i64>, _>("total_output_tokens")?.unwrap_or(0),
            total_cost_usd: row.try_get::<Option<f64>, _>("total_cost")?.unwrap_or(0.0),
            avg_latency_ms: row.try_get::<Option<f64>, _>("avg_latency")?.unwrap_or(0.0),
        })
    }

    async fn count_grouped_by(
        &self,
        column: &'static str,
        range: &TimeRange,
    ) -> Result<BTreeMap<String, u64>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
        builder.push(column).push(", COUNT(*) FROM ai_logs WHERE 1=1");
        range.push_conditions(&mut builder);
        builder.push(" GROUP BY ").push(column);

        let rows: Vec<(String, i64)> = builder.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows
            .into_iter()
            .map(|(key, count)| (key, count.max(0) as u64))
            .collect())
    }

    /// Conversation ids ordered by their most recent event, newest first
    pub async fn distinct_conversation_ids(&self, limit: usize) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar(
            "SELECT conversation_id
             FROM ai_logs
             WHERE conversation_id IS NOT NULL
             GROUP BY conversation_id
             ORDER BY MAX(timestamp) DESC
             LIMIT ?",
        )
        .bind(to_i64(limit))
        .fetch_all(self.pool())
        .await?;

        Ok(ids)
    }

    /// All distinct model names, sorted
    pub async fn distinct_model_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar(
            "SELECT DISTINCT model_name
             FROM ai_logs
             WHERE model_name IS NOT NULL
             ORDER BY model_name",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(names)
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Read-only façade over a log store, for dashboards and reports
#[derive(Clone)]
pub struct LogStorage {
    store: Arc<LogStore>,
}

impl LogStorage {
    /// Open the database at `path`
    ///
    /// With `create_if_missing = false`, a missing file yields
    /// [`crate::error::ObservabilityError::NotFound`].
    pub async fn open(path: impl AsRef<Path>, create_if_missing: bool) -> Result<Self> {
        let store = LogStore::open_with(path, StoreOptions { create_if_missing }).await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }

    pub async fn query_logs(&self, filter: &LogFilter) -> Result<Vec<StoredLog>> {
        self.store.query(filter).await
    }

    /// Every event of one conversation, newest first
    pub async fn get_conversation_logs(&self, conversation_id: &str) -> Result<Vec<StoredLog>> {
        let filter = LogFilter {
            limit: CONVERSATION_QUERY_LIMIT,
            ..LogFilter::for_conversation(conversation_id)
        };
        self.store.query(&filter).await
    }

    pub async fn get_statistics(&self, range: &TimeRange) -> Result<LogStatistics> {
        self.store.aggregate(range).await
    }

    pub async fn get_unique_conversation_ids(&self, limit: usize) -> Result<Vec<String>> {
        self.store.distinct_conversation_ids(limit).await
    }

    pub async fn get_unique_model_names(&self) -> Result<Vec<String>> {
        self.store.distinct_model_names().await
    }
}
