//! Admin service - users, transactions and audit logs for the dashboard
//!
//! Every call requires an administrator session. Failures are returned as
//! errors; an empty `Vec` always means the backend had no records.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::auth::AuthService;
use super::listing::{
    paginate, sort_by_created, AuditLogFilter, Page, PageRequest, SortOrder, TransactionFilter,
    UserFilter,
};
use crate::domain::result::Result;
use crate::domain::{
    AuditLog, AuditLogQuery, AuditLogStats, Transaction, TransactionStatus, User, UserSummary,
};
use crate::ports::BackendApi;

/// Placeholder shown when a transaction's owner is unknown
pub const UNKNOWN_USER_NAME: &str = "Unknown";
/// Placeholder for the e-mail and role of an unknown owner
pub const NOT_AVAILABLE: &str = "N/A";

/// A transaction enriched with its owner's display fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithUser {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub user_name: String,
    pub user_email: String,
    pub user_role: String,
}

/// Headline numbers of the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_users: usize,
    pub total_transactions: usize,
    pub today_transactions: usize,
    /// Transactions whose status is anything but COMPLETED
    pub pending_transactions: usize,
    pub total_balance: Decimal,
}

/// Dashboard numbers plus the latest transactions, from one fetch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_transactions: Vec<TransactionWithUser>,
}

/// Attach owner name, e-mail and role to each transaction
///
/// Users are indexed by id once; each transaction is then a single lookup.
/// The transactions endpoint omits the owner, so a transaction without one
/// is matched through the transaction lists embedded in each user.
pub fn join_transactions_with_users(
    transactions: Vec<Transaction>,
    users: &[User],
) -> Vec<TransactionWithUser> {
    let by_id: HashMap<i64, &User> = users.iter().map(|u| (u.id, u)).collect();
    let by_transaction: HashMap<i64, &User> = users
        .iter()
        .flat_map(|u| u.transactions.iter().map(move |t| (t.id, u)))
        .collect();

    transactions
        .into_iter()
        .map(|mut tx| {
            tx.user_name = None;
            let owner = match tx.owner_id() {
                Some(id) => by_id.get(&id).copied(),
                None => by_transaction.get(&tx.id).copied(),
            };
            match owner {
                Some(user) => TransactionWithUser {
                    user_name: user
                        .display_name()
                        .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string()),
                    user_email: user.email.clone(),
                    user_role: user.role.to_string(),
                    transaction: tx,
                },
                None => TransactionWithUser {
                    user_name: UNKNOWN_USER_NAME.to_string(),
                    user_email: NOT_AVAILABLE.to_string(),
                    user_role: NOT_AVAILABLE.to_string(),
                    transaction: tx,
                },
            }
        })
        .collect()
}

/// Compute dashboard numbers from the full user and transaction lists
pub fn compute_dashboard_stats(
    users: &[User],
    transactions: &[Transaction],
    today: NaiveDate,
) -> DashboardStats {
    DashboardStats {
        total_users: users.len(),
        active_users: users.iter().filter(|u| u.is_active).count(),
        total_transactions: transactions.len(),
        today_transactions: transactions
            .iter()
            .filter(|t| t.created_date() == Some(today))
            .count(),
        pending_transactions: transactions
            .iter()
            .filter(|t| t.status != TransactionStatus::Completed)
            .count(),
        total_balance: users.iter().map(User::total_balance).sum(),
    }
}

/// Service backing the admin dashboard
pub struct AdminService {
    backend: Arc<dyn BackendApi>,
    auth: Arc<AuthService>,
}

impl AdminService {
    pub fn new(backend: Arc<dyn BackendApi>, auth: Arc<AuthService>) -> Self {
        Self { backend, auth }
    }

    fn token(&self) -> Result<String> {
        Ok(self.auth.require_admin()?.access_token)
    }

    // === Users ===

    /// All users with account count, transaction count and total balance
    pub fn users(&self) -> Result<Vec<UserSummary>> {
        let token = self.token()?;
        Ok(self
            .backend
            .list_users(&token)?
            .into_iter()
            .map(UserSummary::from)
            .collect())
    }

    pub fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<UserSummary>> {
        let users: Vec<UserSummary> = self
            .users()?
            .into_iter()
            .filter(|u| filter.matches(u))
            .collect();
        Ok(paginate(users, page))
    }

    // === Transactions ===

    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        let token = self.token()?;
        self.backend.list_transactions(&token)
    }

    /// All transactions joined with their owners
    pub fn transactions_with_users(&self) -> Result<Vec<TransactionWithUser>> {
        let token = self.token()?;
        let transactions = self.backend.list_transactions(&token)?;
        let users = self.backend.list_users(&token)?;
        Ok(join_transactions_with_users(transactions, &users))
    }

    /// Filtered, sorted rows before pagination (what an export covers)
    pub fn filtered_transactions(
        &self,
        filter: &TransactionFilter,
        order: SortOrder,
    ) -> Result<Vec<TransactionWithUser>> {
        let mut rows: Vec<TransactionWithUser> = self
            .transactions_with_users()?
            .into_iter()
            .filter(|row| {
                filter.matches(
                    &row.transaction,
                    Some(row.user_name.as_str()),
                    Some(row.user_email.as_str()),
                )
            })
            .collect();
        sort_by_created(&mut rows, order, |row| row.transaction.created_at);
        Ok(rows)
    }

    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<Page<TransactionWithUser>> {
        Ok(paginate(self.filtered_transactions(filter, order)?, page))
    }

    /// Find one transaction by reference (case-insensitive) or numeric id
    pub fn find_transaction(&self, reference: &str) -> Result<Option<TransactionWithUser>> {
        let needle = reference.trim();
        Ok(self.transactions_with_users()?.into_iter().find(|row| {
            row.transaction.reference().eq_ignore_ascii_case(needle)
                || row.transaction.id.to_string() == needle
        }))
    }

    // === Dashboard ===

    pub fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats> {
        let token = self.token()?;
        let users = self.backend.list_users(&token)?;
        let transactions = self.backend.list_transactions(&token)?;
        Ok(compute_dashboard_stats(&users, &transactions, today))
    }

    /// Stats and the `limit` newest transactions from a single pair of requests
    pub fn dashboard(&self, today: NaiveDate, limit: usize) -> Result<Dashboard> {
        let token = self.token()?;
        let users = self.backend.list_users(&token)?;
        let transactions = self.backend.list_transactions(&token)?;

        let stats = compute_dashboard_stats(&users, &transactions, today);
        let mut recent = join_transactions_with_users(transactions, &users);
        sort_by_created(&mut recent, SortOrder::Desc, |row| row.transaction.created_at);
        recent.truncate(limit);

        Ok(Dashboard {
            stats,
            recent_transactions: recent,
        })
    }

    // === Audit logs ===

    pub fn audit_logs(&self) -> Result<Vec<AuditLog>> {
        let token = self.token()?;
        self.backend.list_audit_logs(&token)
    }

    pub fn filtered_audit_logs(
        &self,
        filter: &AuditLogFilter,
        order: SortOrder,
    ) -> Result<Vec<AuditLog>> {
        let mut logs: Vec<AuditLog> = self
            .audit_logs()?
            .into_iter()
            .filter(|l| filter.matches(l))
            .collect();
        sort_by_created(&mut logs, order, |l| l.created_at);
        Ok(logs)
    }

    pub fn list_audit_logs(
        &self,
        filter: &AuditLogFilter,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<Page<AuditLog>> {
        Ok(paginate(self.filtered_audit_logs(filter, order)?, page))
    }

    /// Server-side search
    pub fn search_audit_logs(&self, query: &AuditLogQuery) -> Result<Vec<AuditLog>> {
        let token = self.token()?;
        self.backend.search_audit_logs(&token, query)
    }

    pub fn audit_log_stats(&self) -> Result<AuditLogStats> {
        let token = self.token()?;
        self.backend.audit_log_stats(&token)
    }

    /// Delete every audit log on the server
    pub fn clear_audit_logs(&self) -> Result<String> {
        let token = self.token()?;
        self.backend.clear_audit_logs(&token)
    }

    /// Entries of the older `/admin/logs` endpoint
    pub fn legacy_logs(&self) -> Result<Vec<AuditLog>> {
        let token = self.token()?;
        self.backend.list_legacy_logs(&token)
    }
}
