//! Output formatting utilities

use chrono::NaiveDateTime;
use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::Decimal;

use ccx_core::services::Page;
use ccx_core::TransactionStatus;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Two decimals with the currency code, when known
pub fn format_amount(amount: Decimal, currency: Option<&str>) -> String {
    match currency.filter(|c| !c.is_empty()) {
        Some(c) => format!("{:.2} {}", amount, c),
        None => format!("{:.2}", amount),
    }
}

pub fn format_optional_amount(amount: Option<Decimal>, currency: Option<&str>) -> String {
    amount
        .map(|a| format_amount(a, currency))
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_date_time(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_status(status: &TransactionStatus) -> ColoredString {
    match status {
        TransactionStatus::Completed => status.as_str().green(),
        TransactionStatus::Pending | TransactionStatus::Processing => status.as_str().yellow(),
        TransactionStatus::Failed | TransactionStatus::Cancelled => status.as_str().red(),
        TransactionStatus::Other(s) => s.as_str().normal(),
    }
}

/// "Showing 21-40 of 57 (page 2/3)"
pub fn print_page_footer<T>(page: &Page<T>, noun: &str) {
    println!(
        "{}",
        format!(
            "Showing {}-{} of {} {} (page {}/{})",
            page.first_index(),
            page.last_index(),
            page.total_items,
            noun,
            page.page,
            page.total_pages.max(1)
        )
        .dimmed()
    );
    if page.has_next() {
        println!(
            "{}",
            format!("Next page: --page {}", page.page + 1).dimmed()
        );
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
