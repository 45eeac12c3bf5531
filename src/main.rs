use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use ai_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    init_tracing();

    // Dispatch to appropriate command handler
    match args.command {
        cli::Commands::Logs(logs_args) => {
            commands::logs::execute(args.db, logs_args).await?;
        }
        cli::Commands::Conversation(conv_args) => {
            commands::logs::execute_conversation(args.db, conv_args).await?;
        }
        cli::Commands::Stats(stats_args) => {
            commands::stats::execute(args.db, stats_args).await?;
        }
        cli::Commands::Conversations { limit } => {
            commands::stats::list_conversations(args.db, limit).await?;
        }
        cli::Commands::Models => {
            commands::stats::list_models(args.db).await?;
        }
        cli::Commands::Record(record_args) => {
            commands::record::execute(args.db, record_args).await?;
        }
        cli::Commands::Version => {
            println!("ai-logs v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Schema v{}",
                ai_observability::observability::SCHEMA_VERSION
            );
        }
    }

    Ok(())
}
