//! HTTP client for the currency-exchange backend
//!
//! Blocking `reqwest` client implementing [`BackendApi`]. Response shapes:
//! - auth endpoints wrap their payload in `{ success, message, data }`
//! - admin list endpoints return bare JSON arrays
//! - `/transactions/my` returns an array (older servers wrap it in `data`)
//! - `/transactions/my/export` returns an XLSX workbook

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{
    ApiEnvelope, AuditLog, AuditLogQuery, AuditLogStats, AuthResponse, ChangePasswordRequest,
    ConversionDirection, DepositRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, TokenVerification, Transaction, User,
};
use crate::ports::BackendApi;

/// Backend base URL used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Request timeout used when nothing is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// MIME type requested from the export endpoint
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// List payload, bare or wrapped in `data`
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) => items,
            ListBody::Wrapped { data } => data,
        }
    }
}

/// Single-object payload, bare or wrapped in `data`
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemBody<T> {
    Bare(T),
    Wrapped { data: T },
}

impl<T> ItemBody<T> {
    fn into_inner(self) -> T {
        match self {
            ItemBody::Bare(item) => item,
            ItemBody::Wrapped { data } => data,
        }
    }
}

/// Pull a human-readable message out of a JSON body, if there is one
fn body_message(bytes: &[u8]) -> Option<String> {
    let value: JsonValue = serde_json::from_slice(bytes).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(JsonValue::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

/// Currency-exchange backend over HTTP
#[derive(Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpBackend {
    /// Create a client for `base_url` (e.g. `http://localhost:8080/api`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Create a client with the default URL and timeout
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_API_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        }
    }

    /// Send a request, map transport failures and non-2xx statuses
    fn send(&self, label: &str, builder: RequestBuilder) -> Result<Vec<u8>> {
        let response = builder.send().map_err(|e| self.map_request_error(e))?;
        let status = response.status().as_u16();
        debug!("{} -> HTTP {}", label, status);
        self.check_response(response)
    }

    fn send_json<T: DeserializeOwned>(&self, label: &str, builder: RequestBuilder) -> Result<T> {
        let bytes = self.send(label, builder)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::decode(format!("{}: {}", label, e)))
    }

    fn send_for_message(&self, label: &str, builder: RequestBuilder, fallback: &str) -> Result<String> {
        let bytes = self.send(label, builder)?;
        Ok(body_message(&bytes).unwrap_or_else(|| fallback.to_string()))
    }

    fn auth_call<B: Serialize>(&self, path: &str, body: &B) -> Result<AuthResponse> {
        let label = format!("POST {}", path);
        let builder = self.request(Method::POST, path, None).json(body);
        let envelope: ApiEnvelope<AuthResponse> = self.send_json(&label, builder)?;
        Ok(envelope.data.unwrap_or_default())
    }

    fn get_list<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<Vec<T>> {
        let label = format!("GET {}", path);
        let body: ListBody<T> = self.send_json(&label, self.request(Method::GET, path, Some(token)))?;
        Ok(body.into_vec())
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Network(format!(
                "Connection timed out after {} seconds",
                self.timeout_secs
            ))
        } else if error.is_connect() {
            Error::Network(format!("Unable to connect to server at {}", self.base_url))
        } else {
            Error::Network(format!("Request failed: {}", error))
        }
    }

    /// Check response status and return the body, or an appropriate error
    fn check_response(&self, response: Response) -> Result<Vec<u8>> {
        let status = response.status();
        let bytes = response
            .bytes()
            .map_err(|e| Error::Network(format!("Failed to read response: {}", e)))?
            .to_vec();

        if status.is_success() {
            return Ok(bytes);
        }

        let message = body_message(&bytes);
        match status.as_u16() {
            401 | 403 => Err(Error::Unauthorized(message.unwrap_or_else(|| {
                "Session expired or access denied. Please log in again.".to_string()
            }))),
            code => Err(Error::Api {
                status: code,
                message: message.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unexpected response")
                        .to_string()
                }),
            }),
        }
    }
}

impl BackendApi for HttpBackend {
    fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.auth_call("/auth/login", request)
    }

    fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.auth_call("/auth/register", request)
    }

    fn refresh_token(&self, request: &RefreshTokenRequest) -> Result<AuthResponse> {
        self.auth_call("/auth/refresh-token", request)
    }

    fn logout(&self, token: &str) -> Result<()> {
        self.send(
            "POST /auth/logout",
            self.request(Method::POST, "/auth/logout", Some(token)),
        )?;
        Ok(())
    }

    fn verify_token(&self, token: &str) -> Result<TokenVerification> {
        let envelope: ApiEnvelope<TokenVerification> = self.send_json(
            "GET /auth/verify-token",
            self.request(Method::GET, "/auth/verify-token", Some(token)),
        )?;
        // A 2xx answer means the token was accepted
        Ok(envelope.data.unwrap_or(TokenVerification {
            valid: true,
            message: envelope.message,
            expires_in: None,
        }))
    }

    fn request_password_reset(&self, email: &str) -> Result<String> {
        let builder = self
            .request(Method::POST, "/auth/request-password-reset", None)
            .query(&[("email", email.trim())]);
        self.send_for_message(
            "POST /auth/request-password-reset",
            builder,
            "Password reset requested",
        )
    }

    fn reset_password(&self, request: &ResetPasswordRequest) -> Result<String> {
        let builder = self
            .request(Method::POST, "/auth/reset-password", None)
            .json(request);
        self.send_for_message("POST /auth/reset-password", builder, "Password reset")
    }

    fn change_password(
        &self,
        token: &str,
        user_id: i64,
        request: &ChangePasswordRequest,
    ) -> Result<String> {
        let builder = self
            .request(Method::POST, "/auth/change-password", Some(token))
            .query(&[("userId", user_id)])
            .json(request);
        self.send_for_message("POST /auth/change-password", builder, "Password changed")
    }

    fn get_profile(&self, token: &str, user_id: i64) -> Result<User> {
        let builder = self
            .request(Method::GET, "/auth/profile", Some(token))
            .query(&[("userId", user_id)]);
        let body: ItemBody<User> = self.send_json("GET /auth/profile", builder)?;
        Ok(body.into_inner())
    }

    fn list_users(&self, token: &str) -> Result<Vec<User>> {
        self.get_list("/admin/all/users", token)
    }

    fn list_transactions(&self, token: &str) -> Result<Vec<Transaction>> {
        self.get_list("/admin/all/transactions", token)
    }

    fn list_legacy_logs(&self, token: &str) -> Result<Vec<AuditLog>> {
        self.get_list("/admin/logs", token)
    }

    fn list_audit_logs(&self, token: &str) -> Result<Vec<AuditLog>> {
        self.get_list("/admin/audit-logs", token)
    }

    fn search_audit_logs(&self, token: &str, query: &AuditLogQuery) -> Result<Vec<AuditLog>> {
        let builder = self
            .request(Method::GET, "/admin/audit-logs/search", Some(token))
            .query(&query.to_params());
        let body: ListBody<AuditLog> = self.send_json("GET /admin/audit-logs/search", builder)?;
        Ok(body.into_vec())
    }

    fn audit_log_stats(&self, token: &str) -> Result<AuditLogStats> {
        let body: ItemBody<AuditLogStats> = self.send_json(
            "GET /admin/audit-logs/stats",
            self.request(Method::GET, "/admin/audit-logs/stats", Some(token)),
        )?;
        Ok(body.into_inner())
    }

    fn clear_audit_logs(&self, token: &str) -> Result<String> {
        self.send_for_message(
            "DELETE /admin/audit-logs/clear",
            self.request(Method::DELETE, "/admin/audit-logs/clear", Some(token)),
            "Audit logs cleared",
        )
    }

    fn convert(
        &self,
        token: &str,
        direction: ConversionDirection,
        amount: Decimal,
    ) -> Result<Transaction> {
        let builder = self
            .request(Method::POST, "/transactions/convert", Some(token))
            .query(&[
                ("type", direction.as_str().to_string()),
                ("amount", amount.normalize().to_string()),
            ]);
        let body: ItemBody<Transaction> = self.send_json("POST /transactions/convert", builder)?;
        Ok(body.into_inner())
    }

    fn deposit(&self, token: &str, request: &DepositRequest) -> Result<String> {
        let builder = self
            .request(Method::POST, "/transactions/deposit", Some(token))
            .json(request);
        self.send_for_message("POST /transactions/deposit", builder, "Deposit completed")
    }

    fn my_transactions(&self, token: &str) -> Result<Vec<Transaction>> {
        self.get_list("/transactions/my", token)
    }

    fn export_my_transactions(&self, token: &str) -> Result<Vec<u8>> {
        let builder = self
            .request(Method::GET, "/transactions/my/export", Some(token))
            .header(ACCEPT, XLSX_MIME);
        self.send("GET /transactions/my/export", builder)
    }
}
