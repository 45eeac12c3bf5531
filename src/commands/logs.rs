//! Logs query command
//!
//! Query and display AI log events from the SQLite database.

use super::open_storage;
use ai_observability::observability::{Category, LogFilter, Severity, StoredLog, TimeRange};
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

/// Characters of prompt/response text shown per event
const PREVIEW_CHARS: usize = 200;

/// Query and display logs
#[derive(Debug, Clone, Parser)]
pub struct LogsArgs {
    /// Filter by conversation ID
    #[arg(short, long)]
    pub conversation_id: Option<String>,

    /// Filter by category (prompt, response, tool_call, ...)
    #[arg(long)]
    pub category: Option<String>,

    /// Filter by severity (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(short, long)]
    pub severity: Option<String>,

    /// Filter by model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Only show events from the last N hours
    #[arg(long)]
    pub hours: Option<u32>,

    /// Maximum number of results
    #[arg(long, default_value = "500")]
    pub limit: usize,

    /// Number of results to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

/// Show one conversation's events
#[derive(Debug, Clone, Parser)]
pub struct ConversationArgs {
    /// Conversation ID
    pub conversation_id: String,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

impl LogsArgs {
    fn to_filter(&self) -> Result<LogFilter> {
        Ok(LogFilter {
            conversation_id: self.conversation_id.clone().filter(|s| !s.is_empty()),
            category: self.category.as_deref().map(str::parse::<Category>).transpose()?,
            severity: self.severity.as_deref().map(str::parse::<Severity>).transpose()?,
            model_name: self.model.clone().filter(|s| !s.is_empty()),
            time_range: self.hours.map(TimeRange::last_hours).unwrap_or_default(),
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Execute the logs command
pub async fn execute(db: Option<PathBuf>, args: LogsArgs) -> Result<()> {
    let filter = args.to_filter()?;
    let storage = open_storage(db).await?;

    let logs = storage.query_logs(&filter).await?;

    if logs.is_empty() {
        println!("{}", "No logs found matching the criteria".yellow());
        return Ok(());
    }

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&logs)?),
        _ => display_logs_text(&logs),
    }

    Ok(())
}

/// Execute the conversation command (oldest event first)
pub async fn execute_conversation(db: Option<PathBuf>, args: ConversationArgs) -> Result<()> {
    let storage = open_storage(db).await?;

    let mut logs = storage.get_conversation_logs(&args.conversation_id).await?;

    if logs.is_empty() {
        println!(
            "{}",
            format!("No logs found for conversation: {}", args.conversation_id).yellow()
        );
        return Ok(());
    }

    logs.reverse();

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&logs)?),
        _ => {
            println!("{}", "=".repeat(80).dimmed());
            println!("{} {}", "Conversation:".bold(), args.conversation_id.cyan());
            println!("{} {}", "Events:".bold(), logs.len());
            println!("{}", "=".repeat(80).dimmed());
            display_logs_text(&logs);
        }
    }

    Ok(())
}

fn display_logs_text(logs: &[StoredLog]) {
    println!("{}", format!("Found {} log entries", logs.len()).bold());

    for log in logs {
        println!();
        let rendered = format_log_entry(log);
        let mut lines = rendered.lines();
        if let Some(header) = lines.next() {
            println!("{}", colorize_header(header, &log.severity));
        }
        for line in lines {
            println!("{}", line);
        }
    }
}

fn colorize_header(header: &str, severity: &str) -> String {
    match severity {
        "CRITICAL" => header.red().bold().to_string(),
        "ERROR" => header.red().to_string(),
        "WARNING" => header.yellow().to_string(),
        "DEBUG" => header.blue().to_string(),
        _ => header.green().to_string(),
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let clipped: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", clipped)
    } else {
        text.to_string()
    }
}

/// Render one event as plain multi-line text
pub fn format_log_entry(log: &StoredLog) -> String {
    let mut lines = vec![
        format!("[{}] {} | {}", log.timestamp, log.severity, log.category),
        format!(
            "Conversation: {}",
            log.conversation_id.as_deref().unwrap_or("N/A")
        ),
    ];

    if let Some(model) = log.model_name.as_deref().filter(|m| !m.is_empty()) {
        lines.push(format!("Model: {}", model));
    }

    lines.push(format!("Message: {}", log.message));

    if let Some(input) = log.token_count_input {
        lines.push(format!(
            "Tokens: {} in / {} out",
            input,
            log.token_count_output.unwrap_or(0)
        ));
    }

    if let Some(latency) = log.latency_ms {
        lines.push(format!("Latency: {:.2}ms", latency));
    }

    if let Some(cost) = log.cost_usd {
        lines.push(format!("Cost: ${:.6}", cost));
    }

    if let Some(tool) = log.tool_name.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("Tool: {}", tool));
    }

    if let Some(scores) = log.evaluation_scores.as_ref().filter(|s| !s.is_empty()) {
        let rendered: Vec<String> = scores
            .iter()
            .map(|(name, score)| format!("{}: {:.2}", name, score))
            .collect();
        lines.push(format!("Evaluation: {}", rendered.join(", ")));
    }

    if let Some(prompt) = log.prompt_text.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("Prompt: {}", preview(prompt)));
    }

    if let Some(response) = log.response_text.as_deref().filter(|r| !r.is_empty()) {
        lines.push(format!("Response: {}", preview(response)));
    }

    // Tool arguments are often large; they stay available in JSON output
    let shown: serde_json::Map<String, serde_json::Value> = log
        .metadata
        .iter()
        .filter(|(key, _)| key.as_str() != "tool_args")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if !shown.is_empty() {
        lines.push(format!("Metadata: {}", serde_json::Value::Object(shown)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_observability::observability::Metadata;

    fn stored(category: &str) -> StoredLog {
        StoredLog {
            id: "id-1".to_string(),
            timestamp: "2024-05-01T12:00:00.000000+00:00".to_string(),
            conversation_id: None,
            category: category.to_string(),
            severity: "INFO".to_string(),
            message: "Response received from gpt-4o".to_string(),
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

    #[test]
    fn test_format_minimal_entry() {
        let text = format_log_entry(&stored("response"));
        assert_eq!(
            text,
            "[2024-05-01T12:00:00.000000+00:00] INFO | response\n\
             Conversation: N/A\n\
             Message: Response received from gpt-4o"
        );
    }

    #[test]
    fn test_format_full_entry() {
        let mut log = stored("response");
        log.conversation_id = Some("conv-9".to_string());
        log.model_name = Some("gpt-4o".to_string());
        log.token_count_input = Some(120);
        log.token_count_output = Some(30);
        log.latency_ms = Some(812.346);
        log.cost_usd = Some(0.00042);
        log.response_text = Some("x".repeat(250));
        log.evaluation_scores = Some([("relevancy".to_string(), 0.875)].into_iter().collect());
        log.metadata.insert("tool_args".to_string(), serde_json::json!({"q": "big"}));
        log.metadata.insert("attempt".to_string(), serde_json::json!(2));

        let text = format_log_entry(&log);
        assert!(text.contains("Conversation: conv-9"));
        assert!(text.contains("Model: gpt-4o"));
        assert!(text.contains("Tokens: 120 in / 30 out"));
        assert!(text.contains("Latency: 812.35ms"));
        assert!(text.contains("Cost: $0.000420"));
        assert!(text.contains("Evaluation: relevancy: 0.88"));
        assert!(text.contains(&format!("Response: {}...", "x".repeat(200))));
        assert!(text.contains("Metadata: {\"attempt\":2}"));
        assert!(!text.contains("tool_args"));
    }

    #[test]
    fn test_to_filter_parses_taxonomy() {
        let args = LogsArgs {
            conversation_id: Some(String::new()),
            category: Some("tool_result".to_string()),
            severity: Some("warning".to_string()),
            model: None,
            hours: None,
            limit: 20,
            offset: 5,
            format: "text".to_string(),
        };

        let filter = args.to_filter().unwrap();
        assert!(filter.conversation_id.is_none());
        assert_eq!(filter.category, Some(Category::ToolResult));
        assert_eq!(filter.severity, Some(Severity::Warning));
        assert_eq!(filter.time_range, TimeRange::default());
        assert_eq!((filter.limit, filter.offset), (20, 5));
    }

    #[test]
    fn test_to_filter_rejects_unknown_category() {
        let args = LogsArgs {
            conversation_id: None,
            category: Some("telemetry".to_string()),
            severity: None,
            model: None,
            hours: None,
            limit: 20,
            offset: 0,
            format: "text".to_string(),
        };

        assert!(args.to_filter().is_err());
    }
}
