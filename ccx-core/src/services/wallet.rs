//! Wallet service - conversions, deposits and history for the end user

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::auth::AuthService;
use super::listing::{paginate, sort_by_created, Page, PageRequest, SortOrder, TransactionFilter};
use crate::domain::result::{Error, Result};
use crate::domain::validation;
use crate::domain::{
    ConversionDirection, Currency, DepositRequest, Transaction, TransactionType,
};
use crate::ports::BackendApi;

/// Entry every XLSX package must contain
const XLSX_MANIFEST: &str = "[Content_Types].xml";

/// Dashboard figures recomputed from the user's history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub total_conversions: usize,
    pub total_deposits: usize,
    pub mad_balance: Decimal,
    pub rwf_balance: Decimal,
    pub last_conversion_at: Option<NaiveDateTime>,
    pub last_deposit_at: Option<NaiveDateTime>,
}

impl WalletSummary {
    pub fn balance(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::MAD => self.mad_balance,
            Currency::RWF => self.rwf_balance,
        }
    }
}

/// Recompute balances and counters from a transaction list
///
/// A conversion debits its source currency by `amount` and credits the
/// target by `finalAmount`; a deposit credits its currency by `amount`.
/// Both balances are clamped at zero.
pub fn summarize(transactions: &[Transaction]) -> WalletSummary {
    let mut summary = WalletSummary::default();
    let mut mad = Decimal::ZERO;
    let mut rwf = Decimal::ZERO;

    let mut credit = |currency: Currency, delta: Decimal| match currency {
        Currency::MAD => mad += delta,
        Currency::RWF => rwf += delta,
    };

    for tx in transactions {
        match tx.tx_type {
            TransactionType::Conversion(direction) => {
                summary.total_conversions += 1;
                summary.last_conversion_at = summary.last_conversion_at.max(tx.created_at);
                credit(direction.source(), -tx.amount);
                credit(direction.target(), tx.final_amount.unwrap_or_default());
            }
            TransactionType::Deposit(currency) => {
                summary.total_deposits += 1;
                summary.last_deposit_at = summary.last_deposit_at.max(tx.created_at);
                credit(currency, tx.amount);
            }
            TransactionType::Other(_) => {}
        }
    }

    summary.mad_balance = mad.max(Decimal::ZERO);
    summary.rwf_balance = rwf.max(Decimal::ZERO);
    summary
}

/// Check that `bytes` is a ZIP container holding an XLSX manifest
pub fn check_xlsx(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::decode("Export is empty"));
    }
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::decode(format!("Export is not a spreadsheet: {}", e)))?;
    archive
        .by_name(XLSX_MANIFEST)
        .map_err(|_| Error::decode("Export is not an XLSX workbook"))?;
    Ok(())
}

/// Default name of a downloaded export
pub fn export_file_name(unix_millis: i64) -> String {
    format!("transactions_{}.xlsx", unix_millis)
}

/// A spreadsheet written to disk
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Service for the end-user wallet screens
pub struct WalletService {
    backend: Arc<dyn BackendApi>,
    auth: Arc<AuthService>,
}

impl WalletService {
    pub fn new(backend: Arc<dyn BackendApi>, auth: Arc<AuthService>) -> Self {
        Self { backend, auth }
    }

    fn token(&self) -> Result<String> {
        Ok(self.auth.require_session()?.access_token)
    }

    /// Convert `amount` of the source currency
    pub fn convert(&self, direction: ConversionDirection, amount: Decimal) -> Result<Transaction> {
        validation::validate_amount(amount)?;
        let token = self.token()?;
        let tx = self.backend.convert(&token, direction, amount)?;
        debug!("conversion {} recorded as transaction {}", direction.as_str(), tx.id);
        Ok(tx)
    }

    pub fn deposit(&self, currency: Currency, amount: Decimal) -> Result<String> {
        validation::validate_amount(amount)?;
        let token = self.token()?;
        self.backend
            .deposit(&token, &DepositRequest { amount, currency })
    }

    /// The user's transactions, newest first
    pub fn history(&self) -> Result<Vec<Transaction>> {
        let token = self.token()?;
        let mut txs = self.backend.my_transactions(&token)?;
        sort_by_created(&mut txs, SortOrder::Desc, |t| t.created_at);
        Ok(txs)
    }

    pub fn history_page(
        &self,
        filter: &TransactionFilter,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<Page<Transaction>> {
        let mut txs: Vec<Transaction> = self
            .history()?
            .into_iter()
            .filter(|t| filter.matches(t, None, None))
            .collect();
        sort_by_created(&mut txs, order, |t| t.created_at);
        Ok(paginate(txs, page))
    }

    pub fn summary(&self) -> Result<WalletSummary> {
        let token = self.token()?;
        Ok(summarize(&self.backend.my_transactions(&token)?))
    }

    /// Download the spreadsheet export
    ///
    /// `target` may be a directory (a timestamped file name is chosen) or a
    /// file path.
    pub fn export(&self, target: &Path) -> Result<ExportedFile> {
        let token = self.token()?;
        let bytes = self.backend.export_my_transactions(&token)?;
        check_xlsx(&bytes)?;

        let path = if target.is_dir() {
            target.join(export_file_name(Utc::now().timestamp_millis()))
        } else {
            target.to_path_buf()
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &bytes)?;

        Ok(ExportedFile {
            path,
            bytes: bytes.len(),
        })
    }
}
