//! Record command
//!
//! Emit a single event through the process-wide default logger, e.g. from
//! shell scripts wrapping model calls.

use super::resolve_db_path;
use ai_observability::config;
use ai_observability::observability::{
    ai_logger, set_ai_logger, AiLogger, Category, LogRequest, Severity,
};
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Record one event
#[derive(Debug, Clone, Parser)]
pub struct RecordArgs {
    /// Event category (prompt, response, tool_call, ...)
    #[arg(long)]
    pub category: String,

    /// Short human-readable summary
    #[arg(long)]
    pub message: String,

    /// Severity (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(short, long, default_value = "INFO")]
    pub severity: String,

    /// Conversation ID
    #[arg(short, long)]
    pub conversation_id: Option<String>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Extra metadata as a JSON object
    #[arg(long)]
    pub metadata: Option<String>,
}

impl RecordArgs {
    fn to_request(&self) -> Result<LogRequest> {
        let mut request = LogRequest::new(self.category.parse::<Category>()?, self.message.clone())
            .severity(self.severity.parse::<Severity>()?);

        request.conversation_id = self.conversation_id.clone();
        request.model_name = self.model.clone();

        if let Some(raw) = &self.metadata {
            let metadata: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
            request = request.metadata(metadata);
        }

        Ok(request)
    }
}

/// Execute the record command
pub async fn execute(db: Option<PathBuf>, args: RecordArgs) -> Result<()> {
    let request = args.to_request()?;

    // An explicit --db replaces the environment-configured default logger
    if db.is_some() {
        let mut cfg = config::load_config()?;
        cfg.db_path = resolve_db_path(db)?.display().to_string();
        let logger = AiLogger::new(cfg.logger_config()?).await?;
        set_ai_logger(Arc::new(logger)).await;
    }

    let logger = ai_logger().await?;

    match logger.log(request).await? {
        Some(event) => println!("{} {}", "Recorded".green().bold(), event.id),
        None => println!(
            "{}",
            "Skipped: severity below threshold or category disabled".yellow()
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RecordArgs {
        RecordArgs {
            category: "guardrail".to_string(),
            message: "Blocked off-topic request".to_string(),
            severity: "warning".to_string(),
            conversation_id: Some("conv-3".to_string()),
            model: None,
            metadata: Some(r#"{"rule": "topic"}"#.to_string()),
        }
    }

    #[test]
    fn test_to_request() {
        let request = args().to_request().unwrap();
        assert_eq!(request.category, Category::Guardrail);
        assert_eq!(request.severity, Severity::Warning);
        assert_eq!(request.conversation_id.as_deref(), Some("conv-3"));
        assert_eq!(request.metadata.get("rule"), Some(&serde_json::json!("topic")));
    }

    #[test]
    fn test_to_request_rejects_bad_metadata() {
        let mut bad = args();
        bad.metadata = Some("[1, 2]".to_string());
        assert!(bad.to_request().is_err());
    }

    #[test]
    fn test_to_request_rejects_bad_severity() {
        let mut bad = args();
        bad.severity = "LOUD".to_string();
        assert!(bad.to_request().is_err());
    }
}
