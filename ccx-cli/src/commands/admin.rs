//! Admin commands - dashboard, users, transactions and audit logs

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::{Local, Utc};
use clap::{Subcommand, ValueEnum};
use colored::Colorize;

use ccx_core::domain::AuditLogQuery;
use ccx_core::services::listing::{paginate, sort_by_created};
use ccx_core::services::{export, AuditLogFilter, SortOrder, UserFilter};
use ccx_core::{AuditLog, Role};

use super::{confirm, get_context, parse_optional_date, PageArgs, TransactionFilterArgs};
use crate::output;

/// Rows shown under the dashboard numbers
const RECENT_TRANSACTIONS: usize = 5;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportKind {
    Transactions,
    AuditLogs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Dashboard numbers and latest transactions
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List users
    Users {
        /// Search name, e-mail or phone
        #[arg(long, short)]
        search: Option<String>,
        /// Only this role (USER or ADMIN)
        #[arg(long)]
        role: Option<String>,
        /// Only active accounts
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        /// Only inactive accounts
        #[arg(long)]
        inactive: bool,
        /// Include administrator accounts
        #[arg(long)]
        include_admins: bool,
        #[command(flatten)]
        paging: PageArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all transactions with their owners
    Transactions {
        #[command(flatten)]
        filter: TransactionFilterArgs,
        #[command(flatten)]
        paging: PageArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one transaction by reference or id
    Show {
        /// Transaction reference or numeric id
        reference: String,
        /// Save the details sheet to a file or directory
        #[arg(long)]
        save: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List audit logs
    Logs {
        /// Search actor, action, entity or IP address
        #[arg(long, short)]
        search: Option<String>,
        /// Action type (LOGIN, CONVERSION, ...)
        #[arg(long)]
        action: Option<String>,
        /// Entity type (USER, TRANSACTION, ...)
        #[arg(long)]
        entity: Option<String>,
        /// Creation date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Oldest first
        #[arg(long)]
        asc: bool,
        /// Read the older /admin/logs endpoint
        #[arg(long)]
        legacy: bool,
        /// Print the full details block of each entry
        #[arg(long)]
        details: bool,
        #[command(flatten)]
        paging: PageArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search audit logs on the server
    Search {
        /// Actor e-mail
        #[arg(long)]
        user_email: Option<String>,
        /// Action type
        #[arg(long)]
        action: Option<String>,
        /// Entity type
        #[arg(long)]
        entity: Option<String>,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Audit log statistics
    AuditStats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every audit log on the server
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export transactions or audit logs to a file
    Export {
        /// What to export
        #[arg(value_enum)]
        kind: ExportKind,
        #[command(flatten)]
        filter: TransactionFilterArgs,
        /// File format (CSV applies to transactions)
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output file or directory
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn upper(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_uppercase())
        .filter(|v| !v.is_empty())
}

/// Resolve `target` to a file path, using `file_name` when it is a directory
fn output_file(target: &Path, file_name: &str) -> PathBuf {
    if target.is_dir() {
        target.join(file_name)
    } else {
        target.to_path_buf()
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn print_audit_table(logs: &[AuditLog]) {
    let mut table = output::create_table();
    table.set_header(vec!["Time", "User", "Action", "Entity", "Entity ID", "IP"]);
    for log in logs {
        table.add_row(vec![
            output::format_date_time(log.created_at),
            log.actor().to_string(),
            log.action_type.clone(),
            log.entity_type.clone(),
            log.entity_id.map(|id| id.to_string()).unwrap_or_default(),
            log.ip_address.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
}

pub fn run(command: AdminCommands) -> Result<()> {
    let ctx = get_context()?;
    let admin = &ctx.admin_service;

    match command {
        AdminCommands::Stats { json } => {
            let dashboard = admin.dashboard(Local::now().date_naive(), RECENT_TRANSACTIONS)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
                return Ok(());
            }
            let stats = &dashboard.stats;
            let recent = &dashboard.recent_transactions;

            println!("{}", "Dashboard".bold());
            let mut table = output::create_table();
            table.add_row(vec!["Users".to_string(), stats.total_users.to_string()]);
            table.add_row(vec!["Active users".to_string(), stats.active_users.to_string()]);
            table.add_row(vec![
                "Transactions".to_string(),
                stats.total_transactions.to_string(),
            ]);
            table.add_row(vec!["Today".to_string(), stats.today_transactions.to_string()]);
            table.add_row(vec![
                "Not completed".to_string(),
                stats.pending_transactions.to_string(),
            ]);
            table.add_row(vec![
                "Total balance".to_string(),
                output::format_amount(stats.total_balance, None),
            ]);
            println!("{}", table);

            if !recent.is_empty() {
                println!();
                println!("{}", "Recent transactions".bold());
                let mut table = output::create_table();
                table.set_header(vec!["Date", "Reference", "User", "Type", "Amount", "Status"]);
                for row in recent {
                    let tx = &row.transaction;
                    table.add_row(vec![
                        output::format_date_time(tx.created_at),
                        tx.reference().to_string(),
                        row.user_name.clone(),
                        export::format_type(&tx.tx_type),
                        output::format_amount(tx.amount, tx.from_currency.as_deref()),
                        output::format_status(&tx.status).to_string(),
                    ]);
                }
                println!("{}", table);
            }
        }
        AdminCommands::Users {
            search,
            role,
            active,
            inactive,
            include_admins,
            paging,
            json,
        } => {
            let role = match role {
                Some(r) => Some(Role::parse(&r).ok_or_else(|| anyhow!("Unknown role '{}'", r))?),
                None => None,
            };
            let filter = UserFilter {
                search,
                include_admins: include_admins || role == Some(Role::Admin),
                role,
                active: match (active, inactive) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            let page = admin.list_users(&filter, paging.request(ctx.config.page_sizes.users))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }
            if page.is_empty() {
                println!("No users found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec![
                "", "Name", "Email", "Phone", "Role", "Status", "Accounts", "Balance",
            ]);
            for user in &page.items {
                let name = user.full_name.clone().unwrap_or_default();
                table.add_row(vec![
                    export::initials(&name),
                    name,
                    user.email.clone(),
                    user.phone_number.clone().unwrap_or_default(),
                    user.role.to_string(),
                    if user.is_active {
                        "active".green().to_string()
                    } else {
                        "inactive".red().to_string()
                    },
                    user.account_count.to_string(),
                    output::format_amount(user.total_balance, None),
                ]);
            }
            println!("{}", table);
            output::print_page_footer(&page, "users");
        }
        AdminCommands::Transactions {
            filter,
            paging,
            json,
        } => {
            let request = paging.request(ctx.config.page_sizes.transactions);
            let page = admin.list_transactions(&filter.to_filter()?, filter.order(), request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }
            if page.is_empty() {
                println!("No transactions found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec![
                "Date", "Reference", "User", "Type", "Amount", "Final", "Rate", "Status",
            ]);
            for row in &page.items {
                let tx = &row.transaction;
                table.add_row(vec![
                    output::format_date_time(tx.created_at),
                    tx.reference().to_string(),
                    format!("{}\n{}", row.user_name, row.user_email.dimmed()),
                    export::format_type(&tx.tx_type),
                    output::format_amount(tx.amount, tx.from_currency.as_deref()),
                    output::format_optional_amount(tx.final_amount, tx.to_currency.as_deref()),
                    tx.exchange_rate.map(|r| r.to_string()).unwrap_or_default(),
                    output::format_status(&tx.status).to_string(),
                ]);
            }
            println!("{}", table);
            output::print_page_footer(&page, "transactions");
        }
        AdminCommands::Show {
            reference,
            save,
            json,
        } => {
            let row = admin
                .find_transaction(&reference)?
                .ok_or_else(|| anyhow!("No transaction matches '{}'", reference))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&row)?);
            } else {
                print!("{}", export::transaction_details_text(&row));
            }

            if let Some(target) = save {
                let reference = match row.transaction.reference() {
                    "" => row.transaction.id.to_string(),
                    r => r.to_string(),
                };
                let path = output_file(&target, &export::transaction_file_name(&reference));
                write_file(&path, &export::transaction_details_text(&row))?;
                if !json {
                    output::success(&format!("Saved to {}", path.display()));
                }
            }
        }
        AdminCommands::Logs {
            search,
            action,
            entity,
            date,
            asc,
            legacy,
            details,
            paging,
            json,
        } => {
            let filter = AuditLogFilter {
                search,
                action_type: upper(action),
                entity_type: upper(entity),
                date: parse_optional_date(date.as_deref())?,
            };
            let order = if asc { SortOrder::Asc } else { SortOrder::Desc };
            let request = paging.request(ctx.config.page_sizes.logs);

            let page = if legacy {
                let mut logs: Vec<AuditLog> = admin
                    .legacy_logs()?
                    .into_iter()
                    .filter(|l| filter.matches(l))
                    .collect();
                sort_by_created(&mut logs, order, |l| l.created_at);
                paginate(logs, request)
            } else {
                admin.list_audit_logs(&filter, order, request)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }
            if page.is_empty() {
                println!("No audit logs found.");
                return Ok(());
            }

            if details {
                for log in &page.items {
                    println!("{}", export::audit_log_details_text(log));
                    println!();
                }
            } else {
                print_audit_table(&page.items);
            }
            output::print_page_footer(&page, "entries");
        }
        AdminCommands::Search {
            user_email,
            action,
            entity,
            date,
            json,
        } => {
            let query = AuditLogQuery {
                user_email,
                action_type: upper(action),
                entity_type: upper(entity),
                date: parse_optional_date(date.as_deref())?,
            };
            let logs = admin.search_audit_logs(&query)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&logs)?);
                return Ok(());
            }
            if logs.is_empty() {
                println!("No audit logs found.");
                return Ok(());
            }
            print_audit_table(&logs);
            println!("{}", format!("{} entries", logs.len()).dimmed());
        }
        AdminCommands::AuditStats { json } => {
            let stats = admin.audit_log_stats()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            println!("{}", "Audit Log Statistics".bold());
            println!("  Total entries: {}", stats.total_logs);
            println!("  Unique users: {}", stats.unique_users);
            println!("  Today: {}", stats.today_logs);
            println!(
                "  Most common action: {}",
                stats.most_common_action.as_deref().unwrap_or("-")
            );
        }
        AdminCommands::Clear { force, json } => {
            if !confirm("Delete ALL audit logs on the server? This cannot be undone.", force || json)? {
                println!("Cancelled.");
                return Ok(());
            }
            let message = admin.clear_audit_logs()?;

            if json {
                println!("{}", serde_json::json!({"message": message}));
            } else {
                output::success(&message);
            }
        }
        AdminCommands::Export {
            kind,
            filter,
            format,
            output: target,
            json,
        } => {
            let today = Local::now().date_naive();
            let (path, count) = match kind {
                ExportKind::Transactions => {
                    let tx_filter = filter.to_filter()?;
                    let rows = admin.filtered_transactions(&tx_filter, filter.order())?;
                    let base = if tx_filter.is_active() {
                        export::filtered_transactions_file_name(today)
                    } else {
                        export::all_transactions_file_name(today)
                    };
                    let (file_name, content) = match format {
                        ExportFormat::Json => (base, export::transactions_document(&rows, Utc::now())?),
                        ExportFormat::Csv => (
                            base.trim_end_matches(".json").to_string() + ".csv",
                            export::transactions_csv(&rows)?,
                        ),
                    };
                    let path = output_file(&target, &file_name);
                    write_file(&path, &content)?;
                    (path, rows.len())
                }
                ExportKind::AuditLogs => {
                    if matches!(format, ExportFormat::Csv) {
                        output::warning("CSV is only available for transactions; writing JSON");
                    }
                    let log_filter = AuditLogFilter {
                        search: filter.search.clone(),
                        date: parse_optional_date(filter.date.as_deref())?,
                        ..AuditLogFilter::default()
                    };
                    let logs = admin.filtered_audit_logs(&log_filter, filter.order())?;
                    let path = output_file(&target, &export::audit_logs_file_name(today));
                    write_file(&path, &export::audit_logs_document(&logs)?)?;
                    (path, logs.len())
                }
            };

            if json {
                println!(
                    "{}",
                    serde_json::json!({"path": path.to_string_lossy(), "count": count})
                );
            } else {
                output::success(&format!("Exported {} records to {}", count, path.display()));
            }
        }
    }

    Ok(())
}
