//! Event schema and the category/severity taxonomy
//!
//! A [`LogEvent`] is created exactly once, by the logger, for a `log` call that
//! passed gating. It is written once and never mutated afterwards.

use crate::error::ObservabilityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Open mapping of extension fields merged into the fixed event envelope
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metric name -> score, as produced by response evaluators
pub type EvaluationScores = BTreeMap<String, f64>;

/// Closed set of AI event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Prompt,
    Response,
    ToolCall,
    ToolResult,
    Evaluation,
    Performance,
    Cost,
    Error,
    Guardrail,
    ModelConfig,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Prompt,
        Category::Response,
        Category::ToolCall,
        Category::ToolResult,
        Category::Evaluation,
        Category::Performance,
        Category::Cost,
        Category::Error,
        Category::Guardrail,
        Category::ModelConfig,
    ];

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Response => "response",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::Evaluation => "evaluation",
            Self::Performance => "performance",
            Self::Cost => "cost",
            Self::Error => "error",
            Self::Guardrail => "guardrail",
            Self::ModelConfig => "model_config",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ObservabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ObservabilityError::Config(format!("unknown log category: {}", s)))
    }
}

/// Totally ordered severity levels
///
/// Ordering is defined by [`Severity::rank`], not by declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Ordinal used for threshold gating
    pub fn rank(&self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Error => 3,
            Self::Critical => 4,
        }
    }

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ObservabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| ObservabilityError::Config(format!("unknown log severity: {}", s)))
    }
}

/// One immutable structured record of an AI interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub conversation_id: Option<String>,
    pub category: Category,
    pub severity: Severity,
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

impl LogEvent {
    /// Create an event with a fresh id and the current UTC time
    pub fn new(category: Category, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            conversation_id: None,
            category,
            severity,
            message: message.into(),
            metadata: Metadata::new(),
            model_name: None,
            prompt_text: None,
            response_text: None,
            token_count_input: None,
            token_count_output: None,
            latency_ms: None,
            cost_usd: None,
            tool_name: None,
            evaluation_scores: None,
        }
    }
}

/// Format a timestamp the way it is persisted
///
/// Fixed-width ISO-8601 with microseconds and an explicit UTC offset, so that
/// lexicographic order in SQLite matches chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Parse a persisted timestamp; `None` if the stored text is not ISO-8601
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
