//! AI logger façade
//!
//! The single write-side entry point: gating, truncation, event construction
//! and delegation to the [`LogStore`]. Also hosts the process-wide default
//! instance.

use super::context;
use super::database::LogStore;
use super::event::{Category, EvaluationScores, LogEvent, Metadata, Severity};
use super::query::LogStorage;
use crate::error::{ObservabilityError, Result};
use arc_swap::ArcSwap;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Default maximum length (in characters) of stored prompt/response text
pub const DEFAULT_MAX_LOG_LENGTH: usize = 10_000;

/// Default database location
pub const DEFAULT_DB_PATH: &str = "./ai_logs.db";

/// Logger construction parameters
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub storage_path: PathBuf,
    /// Events below this severity are dropped before any I/O
    pub min_severity: Severity,
    pub enabled_categories: HashSet<Category>,
    pub max_log_length: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_DB_PATH),
            min_severity: Severity::Info,
            enabled_categories: Category::ALL.into_iter().collect(),
            max_log_length: DEFAULT_MAX_LOG_LENGTH,
        }
    }
}

/// One call to [`AiLogger::log`]
///
/// Typed fields are only meaningful for some categories; `metadata` carries
/// everything else.
#[derive(Debug, Clone)]
pub struct LogRequest {
    pub category: Category,
    pub message: String,
    pub severity: Severity,
    /// Explicit id; falls back to the ambient conversation id when `None`
    pub conversation_id: Option<String>,
    pub model_name: Option<String>,
    pub prompt_text: Option<String>,
    pub response_text: Option<String>,
    pub token_count_input: Option<i64>,
    pub token_count_output: Option<i64>,
    pub latency_ms: Option<f64>,
    pub cost_usd: Option<f64>,
    pub tool_name: Option<String>,
    pub evaluation_scores: Option<EvaluationScores>,
    pub metadata: Metadata,
}

impl LogRequest {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            severity: Severity::Info,
            conversation_id: None,
            model_name: None,
            prompt_text: None,
            response_text: None,
            token_count_input: None,
            token_count_output: None,
            latency_ms: None,
            cost_usd: None,
            tool_name: None,
            evaluation_scores: None,
            metadata: Metadata::new(),
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn prompt(mut self, prompt_text: impl Into<String>) -> Self {
        self.prompt_text = Some(prompt_text.into());
        self
    }

    pub fn response(mut self, response_text: impl Into<String>) -> Self {
        self.response_text = Some(response_text.into());
        self
    }

    pub fn tokens(mut self, input: i64, output: i64) -> Self {
        self.token_count_input = Some(input);
        self.token_count_output = Some(output);
        self
    }

    pub fn latency_ms(mut self, latency_ms: f64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn cost_usd(mut self, cost_usd: f64) -> Self {
        self.cost_usd = Some(cost_usd);
        self
    }

    pub fn tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn evaluation_scores(mut self, scores: EvaluationScores) -> Self {
        self.evaluation_scores = Some(scores);
        self
    }

    /// Add one metadata entry (later entries overwrite earlier ones)
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge a whole metadata mapping
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }
}

/// Truncate `text` to `max_len` characters, appending an elision marker
///
/// The result is exactly `max_len` characters plus the marker
/// `... [truncated N chars]`, where N is the number of dropped characters.
pub fn truncate_text(text: String, max_len: usize) -> String {
    let total = text.chars().count();
    if total <= max_len {
        return text;
    }

    let cut = text
        .char_indices()
        .nth(max_len)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    format!("{}... [truncated {} chars]", &text[..cut], total - max_len)
}

/// Structured logger for prompts, responses, tool calls and evaluations
pub struct AiLogger {
    store: Arc<LogStore>,
    min_severity: Severity,
    enabled_categories: HashSet<Category>,
    max_log_length: usize,
}

impl AiLogger {
    /// Open the configured database (creating it and its parent directory if
    /// needed) and build a logger on top of it
    pub async fn new(config: LoggerConfig) -> Result<Self> {
        if let Some(parent) = config.storage_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = LogStore::open(&config.storage_path).await?;
        Ok(Self::from_store(Arc::new(store))
            .with_min_severity(config.min_severity)
            .with_enabled_categories(config.enabled_categories)
            .with_max_log_length(config.max_log_length))
    }

    /// Logger over an existing store, with default gating
    pub fn from_store(store: Arc<LogStore>) -> Self {
        let defaults = LoggerConfig::default();
        Self {
            store,
            min_severity: defaults.min_severity,
            enabled_categories: defaults.enabled_categories,
            max_log_length: defaults.max_log_length,
        }
    }

    pub fn with_min_severity(mut self, min_severity: Severity) -> Self {
        self.min_severity = min_severity;
        self
    }

    pub fn with_enabled_categories(
        mut self,
        categories: impl IntoIterator<Item = Category>,
    ) -> Self {
        self.enabled_categories = categories.into_iter().collect();
        self
    }

    pub fn with_max_log_length(mut self, max_log_length: usize) -> Self {
        self.max_log_length = max_log_length;
        self
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    /// Read-side view over the same database
    pub fn storage(&self) -> LogStorage {
        LogStorage::new(self.store.clone())
    }

    /// Whether an event with this severity and category would be recorded
    pub fn is_enabled(&self, severity: Severity, category: Category) -> bool {
        severity >= self.min_severity && self.enabled_categories.contains(&category)
    }

    /// Record one event
    ///
    /// Returns `Ok(None)` when the event is gated out (no I/O happens), or the
    /// stored event. Storage failures are returned as-is; deciding whether a
    /// logging failure matters is up to the caller.
    pub async fn log(&self, request: LogRequest) -> Result<Option<LogEvent>> {
        if !self.is_enabled(request.severity, request.category) {
            tracing::trace!(
                category = %request.category,
                severity = %request.severity,
                "AI log event gated"
            );
            return Ok(None);
        }

        let conversation_id = request
            .conversation_id
            .filter(|id| !id.is_empty())
            .or_else(context::get);

        let event = LogEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            conversation_id,
            category: request.category,
            severity: request.severity,
            message: request.message,
            metadata: request.metadata,
            model_name: request.model_name,
            prompt_text: request.prompt_text.map(|t| truncate_text(t, self.max_log_length)),
            response_text: request.response_text.map(|t| truncate_text(t, self.max_log_length)),
            token_count_input: request.token_count_input,
            token_count_output: request.token_count_output,
            latency_ms: request.latency_ms,
            cost_usd: request.cost_usd,
            tool_name: request.tool_name,
            evaluation_scores: request.evaluation_scores,
        };

        self.store.insert(&event).await?;
        Ok(Some(event))
    }

    /// Set the ambient conversation id for the current execution context
    ///
    /// On a tokio runtime this only works inside [`AiLogger::in_conversation`]
    /// or [`context::scope`]; elsewhere it returns a configuration error.
    pub fn set_conversation_id(&self, conversation_id: impl Into<String>) -> Result<()> {
        context::set(conversation_id)
    }

    pub fn clear_conversation_id(&self) {
        context::clear();
    }

    /// Run `fut` as one conversation: every event it logs without an explicit
    /// id is attributed to `conversation_id`
    pub async fn in_conversation<F>(&self, conversation_id: impl Into<String>, fut: F) -> F::Output
    where
        F: Future,
    {
        context::scope(Some(conversation_id.into()), fut).await
    }

    pub async fn log_prompt(
        &self,
        prompt_text: impl Into<String>,
        model_name: &str,
        conversation_id: Option<&str>,
        metadata: Metadata,
    ) -> Result<Option<LogEvent>> {
        let mut request =
            LogRequest::new(Category::Prompt, format!("Prompt sent to {}", model_name))
                .prompt(prompt_text)
                .model(model_name)
                .metadata(metadata);
        request.conversation_id = conversation_id.map(str::to_string);
        self.log(request).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn log_response(
        &self,
        response_text: impl Into<String>,
        model_name: &str,
        token_count_input: i64,
        token_count_output: i64,
        latency_ms: f64,
        cost_usd: Option<f64>,
        conversation_id: Option<&str>,
        metadata: Metadata,
    ) -> Result<Option<LogEvent>> {
        let mut request =
            LogRequest::new(Category::Response, format!("Response received from {}", model_name))
                .response(response_text)
                .model(model_name)
                .tokens(token_count_input, token_count_output)
                .latency_ms(latency_ms)
                .metadata(metadata);
        request.cost_usd = cost_usd;
        request.conversation_id = conversation_id.map(str::to_string);
        self.log(request).await
    }

    /// Tool invocation; the arguments land in metadata under `tool_args`
    pub async fn log_tool_call(
        &self,
        tool_name: &str,
        tool_args: Value,
        conversation_id: Option<&str>,
        metadata: Metadata,
    ) -> Result<Option<LogEvent>> {
        let mut request = LogRequest::new(Category::ToolCall, format!("Tool called: {}", tool_name))
            .tool(tool_name)
            .metadata(metadata)
            .meta("tool_args", tool_args);
        request.conversation_id = conversation_id.map(str::to_string);
        self.log(request).await
    }

    /// Tool outcome; failures are logged at ERROR, successes at INFO
    pub async fn log_tool_result(
        &self,
        tool_name: &str,
        success: bool,
        result: Option<&str>,
        latency_ms: Option<f64>,
        conversation_id: Option<&str>,
        metadata: Metadata,
    ) -> Result<Option<LogEvent>> {
        let (severity, outcome) = if success {
            (Severity::Info, "succeeded")
        } else {
            (Severity::Error, "failed")
        };

        let mut request =
            LogRequest::new(Category::ToolResult, format!("Tool {} {}", tool_name, outcome))
                .severity(severity)
                .tool(tool_name)
                .metadata(metadata)
                .meta("success", success)
                .meta("result", result.map_or(Value::Null, Value::from));
        request.latency_ms = latency_ms;
        request.conversation_id = conversation_id.map(str::to_string);
        self.log(request).await
    }

    pub async fn log_evaluation(
        &self,
        evaluation_scores: EvaluationScores,
        conversation_id: Option<&str>,
        metadata: Metadata,
    ) -> Result<Option<LogEvent>> {
        let mut request = LogRequest::new(Category::Evaluation, "Response evaluation completed")
            .evaluation_scores(evaluation_scores)
            .metadata(metadata);
        request.conversation_id = conversation_id.map(str::to_string);
        self.log(request).await
    }

    /// Failure in the calling application, logged at ERROR with its type
    pub async fn log_error(
        &self,
        message: impl Into<String>,
        error_type: &str,
        conversation_id: Option<&str>,
        metadata: Metadata,
    ) -> Result<Option<LogEvent>> {
        let mut request = LogRequest::new(Category::Error, message)
            .severity(Severity::Error)
            .metadata(metadata)
            .meta("error_type", error_type);
        request.conversation_id = conversation_id.map(str::to_string);
        self.log(request).await
    }
}

static DEFAULT_LOGGER: OnceCell<ArcSwap<AiLogger>> = OnceCell::const_new();

/// Process-wide default logger
///
/// Built on first access from [`crate::config::load_config`]; concurrent first
/// callers all wait for the same initialisation. A failed initialisation
/// leaves the slot empty so a later call can retry.
pub async fn ai_logger() -> Result<Arc<AiLogger>> {
    let slot = DEFAULT_LOGGER
        .get_or_try_init(|| async {
            let config = crate::config::load_config()?.logger_config()?;
            let path = config.storage_path.clone();
            let logger = AiLogger::new(config).await?;
            tracing::info!(
                path = %path.display(),
                min_severity = %logger.min_severity(),
                "Default AI logger initialized"
            );
            Ok::<_, ObservabilityError>(ArcSwap::from_pointee(logger))
        })
        .await?;

    Ok(slot.load_full())
}

/// Replace the process-wide default logger
pub async fn set_ai_logger(logger: Arc<AiLogger>) {
    let slot = DEFAULT_LOGGER
        .get_or_init(|| async { ArcSwap::new(logger.clone()) })
        .await;
    slot.store(logger);
}
