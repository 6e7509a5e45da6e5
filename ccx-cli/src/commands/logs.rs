//! Logs command - view and manage the local activity log

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use ccx_core::services::logging::now_ms;
use ccx_core::services::LoggingService;

use super::{confirm, get_ccx_dir};
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only errors
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete log entries
    Clear {
        /// Delete entries older than N days (all entries when omitted)
        #[arg(long)]
        older_than_days: Option<u64>,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show log statistics and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let ccx_dir = get_ccx_dir()?;
    std::fs::create_dir_all(&ccx_dir)?;
    LoggingService::new(&ccx_dir, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{Local, TimeZone};
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = get_logging_service()?;

    match command {
        LogsCommands::List { limit, errors, json } => {
            let entries = if errors {
                service.get_errors(limit)?
            } else {
                service.get_recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Command", "Outcome", "Duration", "Error"]);

            for entry in entries {
                let outcome = if entry.error_message.is_some() {
                    "failed".red().to_string()
                } else {
                    "ok".green().to_string()
                };
                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.command.unwrap_or(entry.event),
                    outcome,
                    entry
                        .duration_ms
                        .map(|ms| format!("{} ms", ms))
                        .unwrap_or_default(),
                    entry.error_message.unwrap_or_default(),
                ]);
            }

            println!("{}", table);
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let prompt = match older_than_days {
                Some(days) => format!("Delete log entries older than {} days?", days),
                None => "Delete all log entries?".to_string(),
            };
            if !confirm(&prompt, force || json)? {
                println!("Cancelled.");
                return Ok(());
            }

            let deleted = match older_than_days {
                Some(days) => service.delete_before(now_ms() - (days as i64 * 24 * 60 * 60 * 1000))?,
                None => service.clear()?,
            };

            if json {
                println!("{}", serde_json::json!({"deleted": deleted}));
            } else {
                println!("Deleted {} log entries", deleted);
            }
        }
        LogsCommands::Stats { json } => {
            let stats = service.stats(5)?;
            let db_path = service.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "total_entries": stats.total,
                        "error_count": stats.errors,
                        "oldest": stats.oldest,
                        "newest": stats.newest,
                        "top_commands": stats.top_commands,
                        "database_path": db_path.to_string_lossy(),
                        "database_size_bytes": size_bytes
                    })
                );
                return Ok(());
            }

            println!("{}", "Log Statistics".bold());
            println!("  Total entries: {}", stats.total);
            println!("  Errors: {}", stats.errors);
            if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
                println!(
                    "  Range: {} to {}",
                    format_timestamp(oldest),
                    format_timestamp(newest)
                );
            }
            if !stats.top_commands.is_empty() {
                println!("  Most used:");
                for (command, count) in &stats.top_commands {
                    println!("    {} ({})", command, count);
                }
            }
            println!("  Database: {}", db_path.display());
            println!("  Size: {}", output::format_size(size_bytes));
        }
    }

    Ok(())
}
