//! Statistics commands
//!
//! Aggregate counts, token usage and cost, plus conversation/model listings.

use super::open_storage;
use ai_observability::observability::{LogStatistics, TimeRange};
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

/// Show aggregate statistics
#[derive(Debug, Clone, Parser)]
pub struct StatsArgs {
    /// Time window in hours (all time when omitted)
    #[arg(long)]
    pub hours: Option<u32>,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

/// Execute the stats command
pub async fn execute(db: Option<PathBuf>, args: StatsArgs) -> Result<()> {
    let storage = open_storage(db).await?;

    let range = args.hours.map(TimeRange::last_hours).unwrap_or_default();
    let stats = storage.get_statistics(&range).await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => println!("{}", format_statistics(&stats, args.hours)),
    }

    Ok(())
}

/// List recently active conversations
pub async fn list_conversations(db: Option<PathBuf>, limit: usize) -> Result<()> {
    let storage = open_storage(db).await?;
    let ids = storage.get_unique_conversation_ids(limit).await?;

    if ids.is_empty() {
        println!("{}", "No conversations recorded yet".yellow());
        return Ok(());
    }

    println!("{}", "Recent Conversations".bold().underline());
    for (i, id) in ids.iter().enumerate() {
        println!("{:>3}. {}", i + 1, id.cyan());
    }

    Ok(())
}

/// List distinct model names
pub async fn list_models(db: Option<PathBuf>) -> Result<()> {
    let storage = open_storage(db).await?;
    let names = storage.get_unique_model_names().await?;

    if names.is_empty() {
        println!("{}", "No models recorded yet".yellow());
        return Ok(());
    }

    println!("{}", "Models".bold().underline());
    for name in names {
        println!("  {}", name);
    }

    Ok(())
}

/// Render statistics as plain text
pub fn format_statistics(stats: &LogStatistics, hours: Option<u32>) -> String {
    let window = match hours {
        Some(h) => format!("Last {} hours", h),
        None => "All time".to_string(),
    };

    let mut lines = vec![
        "=== AI Observability Statistics ===".to_string(),
        format!("Time Range: {}", window),
        String::new(),
        format!("Total Logs: {}", stats.total_logs),
    ];

    if stats.total_logs == 0 {
        lines.push(String::new());
        lines.push("No logs found. Start using the AI application to generate logs.".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    lines.push("By Category:".to_string());
    for (category, count) in &stats.by_category {
        lines.push(format!("  {}: {}", category, count));
    }

    lines.push(String::new());
    lines.push("By Severity:".to_string());
    for (severity, count) in &stats.by_severity {
        lines.push(format!("  {}: {}", severity, count));
    }

    lines.push(String::new());
    lines.push("Performance Metrics:".to_string());
    lines.push(format!("  Total Input Tokens: {}", format_number(stats.total_input_tokens)));
    lines.push(format!("  Total Output Tokens: {}", format_number(stats.total_output_tokens)));
    lines.push(format!("  Total Cost: ${:.4}", stats.total_cost_usd));
    if stats.avg_latency_ms > 0.0 {
        lines.push(format!("  Avg Latency: {:.2}ms", stats.avg_latency_ms));
    }

    lines.join("\n")
}

/// Format large numbers with commas
fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut result = String::new();

    for (count, ch) in digits.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }

    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-4200), "-4,200");
    }

    #[test]
    fn test_format_empty_statistics() {
        let text = format_statistics(&LogStatistics::default(), Some(24));
        assert!(text.contains("Time Range: Last 24 hours"));
        assert!(text.contains("Total Logs: 0"));
        assert!(text.contains("No logs found"));
        assert!(!text.contains("Performance Metrics"));
    }

    #[test]
    fn test_format_statistics_sections() {
        let mut stats = LogStatistics {
            total_logs: 3,
            total_input_tokens: 12_500,
            total_output_tokens: 800,
            total_cost_usd: 0.01234,
            avg_latency_ms: 0.0,
            ..Default::default()
        };
        stats.by_category.insert("prompt".to_string(), 2);
        stats.by_category.insert("response".to_string(), 1);
        stats.by_severity.insert("INFO".to_string(), 3);

        let text = format_statistics(&stats, None);
        assert!(text.contains("Time Range: All time"));
        assert!(text.contains("  prompt: 2\n  response: 1"));
        assert!(text.contains("  INFO: 3"));
        assert!(text.contains("Total Input Tokens: 12,500"));
        assert!(text.contains("Total Cost: $0.0123"));
        assert!(!text.contains("Avg Latency"));
    }
}
