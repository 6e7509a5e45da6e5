//! Backend API port
//!
//! One method per REST endpoint the clients use. Authenticated endpoints
//! take the bearer token explicitly; the port itself holds no session.

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{
    AuditLog, AuditLogQuery, AuditLogStats, AuthResponse, ChangePasswordRequest,
    ConversionDirection, DepositRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, TokenVerification, Transaction, User,
};

/// Currency-exchange backend abstraction
///
/// `HttpBackend` talks to the real server; tests substitute in-memory fakes.
/// Implementations report every failure as an `Err`, never as placeholder data.
pub trait BackendApi: Send + Sync {
    // === Auth ===

    /// `POST /auth/login`
    ///
    /// Returns the envelope's `data`, or an empty response when it has none.
    fn login(&self, request: &LoginRequest) -> Result<AuthResponse>;

    /// `POST /auth/register`
    fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    /// `POST /auth/refresh-token`
    fn refresh_token(&self, request: &RefreshTokenRequest) -> Result<AuthResponse>;

    /// `POST /auth/logout`
    fn logout(&self, token: &str) -> Result<()>;

    /// `GET /auth/verify-token`
    fn verify_token(&self, token: &str) -> Result<TokenVerification>;

    /// `POST /auth/request-password-reset?email=`; returns the server message
    fn request_password_reset(&self, email: &str) -> Result<String>;

    /// `POST /auth/reset-password`; returns the server message
    fn reset_password(&self, request: &ResetPasswordRequest) -> Result<String>;

    /// `POST /auth/change-password?userId=`; returns the server message
    fn change_password(
        &self,
        token: &str,
        user_id: i64,
        request: &ChangePasswordRequest,
    ) -> Result<String>;

    /// `GET /auth/profile?userId=`
    fn get_profile(&self, token: &str, user_id: i64) -> Result<User>;

    // === Admin ===

    /// `GET /admin/all/users`
    fn list_users(&self, token: &str) -> Result<Vec<User>>;

    /// `GET /admin/all/transactions`
    fn list_transactions(&self, token: &str) -> Result<Vec<Transaction>>;

    /// `GET /admin/logs`
    fn list_legacy_logs(&self, token: &str) -> Result<Vec<AuditLog>>;

    /// `GET /admin/audit-logs`
    fn list_audit_logs(&self, token: &str) -> Result<Vec<AuditLog>>;

    /// `GET /admin/audit-logs/search`
    fn search_audit_logs(&self, token: &str, query: &AuditLogQuery) -> Result<Vec<AuditLog>>;

    /// `GET /admin/audit-logs/stats`
    fn audit_log_stats(&self, token: &str) -> Result<AuditLogStats>;

    /// `DELETE /admin/audit-logs/clear`; returns the server message
    fn clear_audit_logs(&self, token: &str) -> Result<String>;

    // === End user ===

    /// `POST /transactions/convert?type=&amount=`
    fn convert(
        &self,
        token: &str,
        direction: ConversionDirection,
        amount: Decimal,
    ) -> Result<Transaction>;

    /// `POST /transactions/deposit`; returns the server message
    fn deposit(&self, token: &str, request: &DepositRequest) -> Result<String>;

    /// `GET /transactions/my`
    fn my_transactions(&self, token: &str) -> Result<Vec<Transaction>>;

    /// `GET /transactions/my/export`; raw spreadsheet bytes
    fn export_my_transactions(&self, token: &str) -> Result<Vec<u8>>;
}
