//! CLI command implementations

pub mod admin;
pub mod auth;
pub mod config;
pub mod logs;
pub mod password;
pub mod wallet;

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use dialoguer::Password;

use ccx_core::config::Config;
use ccx_core::services::{LoggingService, PageRequest, SortOrder, TransactionFilter};
use ccx_core::{ClientContext, TransactionStatus, TransactionType};

/// Environment variable overriding the client directory
pub const DIR_ENV: &str = "CCX_DIR";

/// Get the client directory from environment or default
pub fn get_ccx_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".ccx"))
        .context("Could not find home directory; set CCX_DIR")
}

/// Build the client context for the configured backend
pub fn get_context() -> Result<ClientContext> {
    let ccx_dir = get_ccx_dir()?;
    std::fs::create_dir_all(&ccx_dir)
        .with_context(|| format!("Failed to create client directory: {:?}", ccx_dir))?;

    let config = Config::load(&ccx_dir)?;
    tracing::debug!("backend {} ({})", config.api_url, config.api_url_source.as_str());
    ClientContext::new(&ccx_dir, config).context("Failed to initialize client")
}

/// Get the activity log
///
/// Returns None if it fails to open; logging never blocks a command.
pub fn get_logger() -> Option<LoggingService> {
    let ccx_dir = get_ccx_dir().ok()?;
    std::fs::create_dir_all(&ccx_dir).ok()?;
    match LoggingService::new(&ccx_dir, env!("CARGO_PKG_VERSION")) {
        Ok(service) => Some(service),
        Err(e) => {
            tracing::debug!("activity log unavailable: {}", e);
            None
        }
    }
}

/// Record a command outcome, ignoring logging failures
pub fn record_outcome(command: &str, started: Instant, result: &Result<()>) {
    let Some(logger) = get_logger() else {
        return;
    };
    let _ = match result {
        Ok(()) => logger.log_command(command, started.elapsed().as_millis() as i64),
        Err(e) => logger.log_error(command, &e.to_string()),
    };
}

/// Read a secret from a pipe, or prompt for it on a terminal
pub fn read_secret(prompt: &str) -> Result<String> {
    if atty::isnt(atty::Stream::Stdin) {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let secret = line.trim_end_matches(['\r', '\n']).to_string();
        if secret.is_empty() {
            bail!("{} was empty on stdin", prompt);
        }
        return Ok(secret);
    }
    Ok(Password::new().with_prompt(prompt).interact()?)
}

/// Read a new password twice and check both entries match
pub fn read_new_secret(prompt: &str) -> Result<(String, String)> {
    if atty::isnt(atty::Stream::Stdin) {
        let secret = read_secret(prompt)?;
        return Ok((secret.clone(), secret));
    }
    let first = Password::new().with_prompt(prompt).interact()?;
    let confirm = Password::new()
        .with_prompt(format!("Confirm {}", prompt.to_lowercase()))
        .interact()?;
    Ok((first, confirm))
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}': expected YYYY-MM-DD", value))
}

pub fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value.map(parse_date).transpose()
}

/// Transaction filter flags shared by `history` and `admin transactions`
#[derive(Args, Debug, Clone, Default)]
pub struct TransactionFilterArgs {
    /// Search reference, user name or e-mail
    #[arg(long, short)]
    pub search: Option<String>,
    /// Transaction type (MAD_TO_RWF, RWF_TO_MAD, DEPOSIT_MAD, DEPOSIT_RWF)
    #[arg(long = "type")]
    pub tx_type: Option<String>,
    /// Status (PENDING, COMPLETED, FAILED, ...)
    #[arg(long)]
    pub status: Option<String>,
    /// Creation date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// Oldest first
    #[arg(long)]
    pub asc: bool,
}

impl TransactionFilterArgs {
    pub fn to_filter(&self) -> Result<TransactionFilter> {
        let normalize = |s: &String| s.trim().to_uppercase().replace('-', "_");
        Ok(TransactionFilter {
            search: self.search.clone(),
            tx_type: self.tx_type.as_ref().map(|t| TransactionType::parse(&normalize(t))),
            status: self.status.as_ref().map(|s| TransactionStatus::parse(&normalize(s))),
            date: parse_optional_date(self.date.as_deref())?,
        })
    }

    pub fn order(&self) -> SortOrder {
        if self.asc {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

/// Pagination flags
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: usize,
    /// Rows per page (defaults to settings.json pageSizes)
    #[arg(long)]
    pub per_page: Option<usize>,
}

impl PageArgs {
    pub fn request(&self, default_per_page: usize) -> PageRequest {
        PageRequest::new(self.page, self.per_page.unwrap_or(default_per_page))
    }
}

/// Ask for confirmation unless `force` is set
pub fn confirm(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    if atty::isnt(atty::Stream::Stdin) {
        bail!("Refusing to continue without a terminal; pass --force");
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
