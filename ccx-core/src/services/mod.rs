//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one client surface.

mod admin;
mod auth;
pub mod export;
pub mod listing;
pub mod logging;
mod wallet;

pub use admin::{
    compute_dashboard_stats, join_transactions_with_users, AdminService, Dashboard, DashboardStats,
    TransactionWithUser, NOT_AVAILABLE, UNKNOWN_USER_NAME,
};
pub use auth::{AuthService, LogoutOutcome, RemoteLogout};
pub use listing::{
    AuditLogFilter, Page, PageRequest, SortOrder, TransactionFilter, UserFilter,
};
pub use logging::{LogEntry, LogEvent, LogStats, LoggingService};
pub use wallet::{check_xlsx, summarize, ExportedFile, WalletService, WalletSummary};
