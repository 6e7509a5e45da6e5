//! Transaction domain model

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{amount, timestamp};

/// The two currencies supported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Moroccan Dirham
    MAD,
    /// Rwandan Franc
    RWF,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::MAD => "MAD",
            Currency::RWF => "RWF",
        }
    }

    /// Long display name
    pub fn label(&self) -> &'static str {
        match self {
            Currency::MAD => "Moroccan Dirham",
            Currency::RWF => "Rwandan Franc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MAD" => Some(Currency::MAD),
            "RWF" => Some(Currency::RWF),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a currency conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionDirection {
    MadToRwf,
    RwfToMad,
}

impl ConversionDirection {
    /// Conversion that debits the given currency
    pub fn from_source(source: Currency) -> Self {
        match source {
            Currency::MAD => ConversionDirection::MadToRwf,
            Currency::RWF => ConversionDirection::RwfToMad,
        }
    }

    pub fn source(&self) -> Currency {
        match self {
            ConversionDirection::MadToRwf => Currency::MAD,
            ConversionDirection::RwfToMad => Currency::RWF,
        }
    }

    pub fn target(&self) -> Currency {
        match self {
            ConversionDirection::MadToRwf => Currency::RWF,
            ConversionDirection::RwfToMad => Currency::MAD,
        }
    }

    /// Wire name used by the `type` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionDirection::MadToRwf => "MAD_TO_RWF",
            ConversionDirection::RwfToMad => "RWF_TO_MAD",
        }
    }

    /// Accepts `MAD_TO_RWF`, `mad-to-rwf`, or a bare source currency
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        match normalized.as_str() {
            "MAD_TO_RWF" => Some(ConversionDirection::MadToRwf),
            "RWF_TO_MAD" => Some(ConversionDirection::RwfToMad),
            other => Currency::parse(other).map(Self::from_source),
        }
    }
}

/// Transaction type as emitted by the backend
///
/// Unknown values are preserved verbatim so they still render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Conversion(ConversionDirection),
    Deposit(Currency),
    Other(String),
}

impl Default for TransactionType {
    fn default() -> Self {
        TransactionType::Other(String::new())
    }
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Conversion(d) => d.as_str(),
            TransactionType::Deposit(Currency::MAD) => "DEPOSIT_MAD",
            TransactionType::Deposit(Currency::RWF) => "DEPOSIT_RWF",
            TransactionType::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "MAD_TO_RWF" => TransactionType::Conversion(ConversionDirection::MadToRwf),
            "RWF_TO_MAD" => TransactionType::Conversion(ConversionDirection::RwfToMad),
            "DEPOSIT_MAD" => TransactionType::Deposit(Currency::MAD),
            "DEPOSIT_RWF" => TransactionType::Deposit(Currency::RWF),
            _ => TransactionType::Other(s.to_string()),
        }
    }
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        TransactionType::parse(&s)
    }
}

impl From<TransactionType> for String {
    fn from(t: TransactionType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

impl TransactionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Cancelled => "CANCELLED",
            TransactionStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => TransactionStatus::Pending,
            "PROCESSING" => TransactionStatus::Processing,
            "COMPLETED" => TransactionStatus::Completed,
            "FAILED" => TransactionStatus::Failed,
            "CANCELLED" => TransactionStatus::Cancelled,
            _ => TransactionStatus::Other(s.to_string()),
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(s: String) -> Self {
        TransactionStatus::parse(&s)
    }
}

impl From<TransactionStatus> for String {
    fn from(s: TransactionStatus) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner reference embedded in some transaction payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOwner {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// A conversion or deposit recorded by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    #[serde(default)]
    pub transaction_ref: Option<String>,
    #[serde(rename = "type", default)]
    pub tx_type: TransactionType,
    #[serde(default)]
    pub from_currency: Option<String>,
    #[serde(default)]
    pub to_currency: Option<String>,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub amount: Decimal,
    /// Amount credited after conversion
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub final_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_reconciled: Option<bool>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<TransactionOwner>,
}

impl Transaction {
    /// Owning user id, from `userId` or the embedded `user` object
    pub fn owner_id(&self) -> Option<i64> {
        self.user_id
            .or_else(|| self.user.as_ref().and_then(|u| u.id))
    }

    /// Calendar date of creation
    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|dt| dt.date())
    }

    /// Completion time, falling back to creation time
    pub fn completed_or_created(&self) -> Option<NaiveDateTime> {
        self.completed_at.or(self.created_at)
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self.tx_type, TransactionType::Conversion(_))
    }

    pub fn is_deposit(&self) -> bool {
        matches!(self.tx_type, TransactionType::Deposit(_))
    }

    pub fn reference(&self) -> &str {
        self.transaction_ref.as_deref().unwrap_or("")
    }
}
