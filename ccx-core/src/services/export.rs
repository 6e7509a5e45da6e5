//! Export formats for the admin screens
//!
//! Plain-text detail sheets, JSON documents and CSV. Nothing here touches
//! the network or the filesystem.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::admin::{TransactionWithUser, NOT_AVAILABLE, UNKNOWN_USER_NAME};
use crate::domain::result::{Error, Result};
use crate::domain::{AuditLog, TransactionType};

const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// `MAD_TO_RWF` becomes `MAD → RWF`
pub fn format_type(tx_type: &TransactionType) -> String {
    tx_type.as_str().replace('_', " → ")
}

/// Up to two uppercase initials, `?` for an empty or unknown name
pub fn initials(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() || name == UNKNOWN_USER_NAME {
        return "?".to_string();
    }
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// `dd/mm/yyyy hh:mm`, or `N/A`
pub fn format_date_time(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_na(value: Option<impl ToString>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Plain-text sheet for a single transaction
pub fn transaction_details_text(row: &TransactionWithUser) -> String {
    let tx = &row.transaction;
    let from = tx.from_currency.as_deref().unwrap_or("");
    let to = tx.to_currency.as_deref().unwrap_or("");
    let created = format_date_time(tx.created_at);

    let mut out = String::new();
    out.push_str("TRANSACTION DETAILS\n");
    out.push_str("========================\n");
    out.push_str(&format!("Reference: {}\n", tx.reference()));
    out.push_str(&format!("Type: {}\n", format_type(&tx.tx_type)));
    out.push_str(&format!("Status: {}\n", tx.status));
    out.push_str(&format!("Date: {}\n", created));
    out.push('\n');
    out.push_str("EXCHANGE DETAILS\n");
    out.push_str("================\n");
    out.push_str(&format!("Amount: {} {}\n", tx.amount, from));
    out.push_str(&format!("Final Amount: {} {}\n", or_na(tx.final_amount), to));
    out.push_str(&format!("Exchange Rate: {}\n", or_na(tx.exchange_rate)));
    out.push_str(&format!("From Currency: {}\n", from));
    out.push_str(&format!("To Currency: {}\n", to));
    out.push('\n');
    out.push_str("USER INFORMATION\n");
    out.push_str("================\n");
    out.push_str(&format!("Name: {}\n", row.user_name));
    out.push_str(&format!("Email: {}\n", row.user_email));
    out.push('\n');
    out.push_str("ADDITIONAL INFO\n");
    out.push_str("===============\n");
    out.push_str(&format!("Created: {}\n", created));
    out.push_str(&format!("Transaction ID: {}\n", tx.id));
    out
}

/// One transaction as it appears in JSON and CSV exports
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow<'a> {
    pub id: i64,
    pub transaction_ref: Option<&'a str>,
    #[serde(rename = "type")]
    pub tx_type: &'a str,
    pub status: &'a str,
    pub amount: Decimal,
    pub from_currency: Option<&'a str>,
    pub final_amount: Option<Decimal>,
    pub to_currency: Option<&'a str>,
    pub exchange_rate: Option<Decimal>,
    pub user_name: &'a str,
    pub user_email: &'a str,
    pub created_at: Option<NaiveDateTime>,
    pub formatted_date: String,
}

impl<'a> From<&'a TransactionWithUser> for ExportRow<'a> {
    fn from(row: &'a TransactionWithUser) -> Self {
        let tx = &row.transaction;
        Self {
            id: tx.id,
            transaction_ref: tx.transaction_ref.as_deref(),
            tx_type: tx.tx_type.as_str(),
            status: tx.status.as_str(),
            amount: tx.amount,
            from_currency: tx.from_currency.as_deref(),
            final_amount: tx.final_amount,
            to_currency: tx.to_currency.as_deref(),
            exchange_rate: tx.exchange_rate,
            user_name: &row.user_name,
            user_email: &row.user_email,
            created_at: tx.created_at,
            formatted_date: format_date_time(tx.created_at),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsDocument<'a> {
    export_date: String,
    total_transactions: usize,
    transactions: Vec<ExportRow<'a>>,
}

/// Pretty JSON `{ exportDate, totalTransactions, transactions }`
pub fn transactions_document(rows: &[TransactionWithUser], now: DateTime<Utc>) -> Result<String> {
    let doc = TransactionsDocument {
        export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_transactions: rows.len(),
        transactions: rows.iter().map(ExportRow::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// CSV with a header row and the same columns as the JSON document
pub fn transactions_csv(rows: &[TransactionWithUser]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(ExportRow::from(row))
            .map_err(|e| Error::Other(format!("CSV export failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Other(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Other(format!("CSV export failed: {}", e)))
}

/// Pretty JSON array of audit log entries
pub fn audit_logs_document(logs: &[AuditLog]) -> Result<String> {
    Ok(serde_json::to_string_pretty(logs)?)
}

/// The "copy details" block of an audit log entry
pub fn audit_log_details_text(log: &AuditLog) -> String {
    format!(
        "Audit Log Details:\nID: {}\nTimestamp: {}\nUser: {}\nAction: {}\nEntity: {}\nEntity ID: {}\nIP Address: {}",
        log.id,
        format_date_time(log.created_at),
        log.actor(),
        log.action_type,
        log.entity_type,
        or_na(log.entity_id),
        or_na(log.ip_address.as_deref().filter(|ip| !ip.is_empty())),
    )
}

pub fn all_transactions_file_name(date: NaiveDate) -> String {
    format!("all-transactions-{}.json", date.format("%Y-%m-%d"))
}

pub fn filtered_transactions_file_name(date: NaiveDate) -> String {
    format!("filtered-transactions-{}.json", date.format("%Y-%m-%d"))
}

pub fn transaction_file_name(reference: &str) -> String {
    let safe: String = reference
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("transaction-{}.txt", safe)
}

pub fn audit_logs_file_name(date: NaiveDate) -> String {
    format!("audit-logs-{}.json", date.format("%Y-%m-%d"))
}
