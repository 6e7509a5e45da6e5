//! Core domain entities
//!
//! Backend DTOs as consumed by the client, the persisted session and the
//! form validation rules. Pure data, no I/O.

pub mod amount;
mod audit_log;
mod auth;
pub mod result;
mod session;
pub mod timestamp;
mod transaction;
mod user;
pub mod validation;

pub use audit_log::{AuditLog, AuditLogQuery, AuditLogStats};
pub use auth::{
    ApiEnvelope, AuthResponse, ChangePasswordRequest, DepositRequest, LoginRequest,
    RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, TokenVerification,
};
pub use session::Session;
pub use transaction::{
    ConversionDirection, Currency, Transaction, TransactionOwner, TransactionStatus,
    TransactionType,
};
pub use user::{BankAccount, Role, User, UserSummary};
