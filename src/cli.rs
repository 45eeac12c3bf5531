use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ai-logs", version, about = "AI observability log viewer")]
pub struct Cli {
    /// Database file path (defaults to configuration / AI_LOG_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Query logged AI events
    Logs(crate::commands::logs::LogsArgs),

    /// Show the timeline of one conversation
    Conversation(crate::commands::logs::ConversationArgs),

    /// Show aggregate statistics
    Stats(crate::commands::stats::StatsArgs),

    /// List the most recently active conversation ids
    Conversations {
        /// Maximum number of ids
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// List the model names seen so far
    Models,

    /// Record one event through the default logger
    Record(crate::commands::record::RecordArgs),

    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_logs_filters() {
        let args = vec![
            "ai-logs", "logs", "--category", "tool_call", "--severity", "ERROR", "--hours", "6",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Logs(logs) => {
                assert_eq!(logs.category.as_deref(), Some("tool_call"));
                assert_eq!(logs.severity.as_deref(), Some("ERROR"));
                assert_eq!(logs.hours, Some(6));
                assert_eq!(logs.limit, 500);
            }
            _ => panic!("Expected Logs command"),
        }
    }

    #[test]
    fn test_cli_parsing_global_db() {
        let args = vec!["ai-logs", "stats", "--db", "/tmp/x.db"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Commands::Stats(_)));
    }

    #[test]
    fn test_cli_parsing_conversation() {
        let args = vec!["ai-logs", "conversation", "conv-1", "-f", "json"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Conversation(conv) => {
                assert_eq!(conv.conversation_id, "conv-1");
                assert_eq!(conv.format, "json");
            }
            _ => panic!("Expected Conversation command"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(vec!["ai-logs"]).is_err());
    }
}
