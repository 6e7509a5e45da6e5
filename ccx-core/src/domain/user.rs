//! User domain model

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{amount, timestamp, Transaction};

/// Backend role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Unknown => "UNKNOWN",
        }
    }

    /// Parse a role name as typed on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bank account linked to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: i64,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_holder: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub rib: Option<String>,
    #[serde(default)]
    pub swift_code: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub current_balance: Decimal,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub last_sync: Option<NaiveDateTime>,
}

/// A user record as returned by the backend
///
/// The full entity (admin endpoints) carries linked bank accounts and
/// transactions; the profile DTO leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Entity exposes `isActive`, the profile DTO exposes `active`
    #[serde(default, alias = "active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub last_login: Option<NaiveDateTime>,
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl User {
    /// Name shown in listings: full name, else the e-mail local part
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.full_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
        self.email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .map(str::to_string)
    }

    /// Sum of the current balances of all linked bank accounts
    pub fn total_balance(&self) -> Decimal {
        self.bank_accounts.iter().map(|a| a.current_balance).sum()
    }
}

/// Admin view of a user with derived counters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub last_login: Option<NaiveDateTime>,
    pub account_count: usize,
    pub transaction_count: usize,
    pub total_balance: Decimal,
    pub bank_accounts: Vec<BankAccount>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        let total_balance = user.total_balance();
        Self {
            id: user.id,
            account_count: user.bank_accounts.len(),
            transaction_count: user.transactions.len(),
            total_balance,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            last_login: user.last_login,
            bank_accounts: user.bank_accounts,
        }
    }
}
