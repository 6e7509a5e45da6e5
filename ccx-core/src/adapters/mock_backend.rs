//! Mock backend server for testing
//!
//! Minimal HTTP server that answers like the currency-exchange backend:
//! - `POST /api/auth/login` returns the `{ success, message, data }` envelope
//! - `GET /api/admin/...` returns bare JSON arrays
//! - `GET /api/transactions/my` returns an array, or `{ data: [...] }`
//! - `GET /api/transactions/my/export` returns raw bytes

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Bearer token the mock accepts
pub const VALID_TOKEN: &str = "valid-token";

/// Mock backend server for testing
pub struct MockBackendServer {
    port: u16,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Behaviour switches for the mock
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Login answers 200 without an access token
    pub login_without_token: bool,
    /// Wrap `/transactions/my` in `{ data: [...] }`
    pub wrap_my_transactions: bool,
    /// Every endpoint answers HTTP 500
    pub server_error: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl MockBackendServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        thread::spawn(move || handle_connection(stream, &cfg));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            thread_handle: Some(thread_handle),
        })
    }

    /// Base URL including the `/api` prefix
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/api", self.port)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockBackendServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_json(&mut stream, 400, "Bad Request", r#"{"message": "Invalid request"}"#);
        return;
    }

    if config.server_error {
        send_json(
            &mut stream,
            500,
            "Internal Server Error",
            r#"{"success": false, "message": "Erreur interne"}"#,
        );
        return;
    }

    let method = parts[0];
    let (path, query) = match parts[1].split_once('?') {
        Some((p, q)) => (p, q),
        None => (parts[1], ""),
    };
    let body = request.split("\r\n\r\n").nth(1).unwrap_or("");
    let authorized = request
        .to_lowercase()
        .contains(&format!("authorization: bearer {}", VALID_TOKEN));

    match (method, path) {
        ("POST", "/api/auth/login") => {
            if !body.contains("\"password\":\"secret1\"") {
                send_json(
                    &mut stream,
                    401,
                    "Unauthorized",
                    r#"{"success": false, "message": "Email ou mot de passe incorrect"}"#,
                );
            } else if config.login_without_token {
                send_json(&mut stream, 200, "OK", r#"{"success": true, "message": "ok", "data": {}}"#);
            } else {
                send_json(&mut stream, 200, "OK", LOGIN_RESPONSE);
            }
        }
        ("POST", "/api/auth/register") => {
            send_json(&mut stream, 200, "OK", r#"{"success": true, "message": "Inscription réussie", "data": {"accessToken": "new"}}"#);
        }
        ("POST", "/api/auth/request-password-reset") => {
            if query.starts_with("email=") {
                send_json(&mut stream, 200, "OK", r#"{"success": true, "message": "Demande de réinitialisation envoyée", "data": null}"#);
            } else {
                send_json(&mut stream, 400, "Bad Request", r#"{"message": "email manquant"}"#);
            }
        }
        (_, p) if !authorized && !p.starts_with("/api/auth/") => {
            send_json(&mut stream, 403, "Forbidden", "");
        }
        (_, _) if !authorized => {
            send_json(&mut stream, 401, "Unauthorized", r#"{"message": "Token invalide"}"#);
        }
        ("POST", "/api/auth/logout") => {
            send_json(&mut stream, 200, "OK", r#"{"success": true, "message": "Déconnexion réussie", "data": null}"#);
        }
        ("GET", "/api/auth/verify-token") => {
            send_json(&mut stream, 200, "OK", r#"{"success": true, "message": "Token vérifié", "data": {"valid": true, "message": "Token valide"}}"#);
        }
        ("GET", "/api/auth/profile") => {
            send_json(&mut stream, 200, "OK", r#"{"success": true, "message": "Profil récupéré", "data": {"id": 1, "email": "admin@bank.ma", "fullName": "Admin", "role": "ADMIN", "active": true}}"#);
        }
        ("GET", "/api/admin/all/users") => send_json(&mut stream, 200, "OK", USERS),
        ("GET", "/api/admin/all/transactions") => send_json(&mut stream, 200, "OK", TRANSACTIONS),
        ("GET", "/api/admin/audit-logs") | ("GET", "/api/admin/logs") => {
            send_json(&mut stream, 200, "OK", AUDIT_LOGS)
        }
        ("GET", "/api/admin/audit-logs/search") => {
            // Echo the query string back through the action type
            let echoed = format!(
                r#"[{{"id": 9, "userEmail": null, "actionType": "{}", "entityType": "USER"}}]"#,
                query
            );
            send_json(&mut stream, 200, "OK", &echoed);
        }
        ("GET", "/api/admin/audit-logs/stats") => {
            send_json(&mut stream, 200, "OK", r#"{"totalLogs": 2, "uniqueUsers": 1, "todayLogs": 0, "mostCommonAction": "LOGIN"}"#);
        }
        ("DELETE", "/api/admin/audit-logs/clear") => {
            send_json(&mut stream, 200, "OK", r#"{"message": "All logs cleared successfully"}"#);
        }
        ("POST", "/api/transactions/convert") => {
            if query.contains("type=MAD_TO_RWF") && query.contains("amount=100") {
                send_json(&mut stream, 200, "OK", CONVERTED);
            } else {
                send_json(&mut stream, 500, "Internal Server Error", r#"{"message": "Solde insuffisant"}"#);
            }
        }
        ("POST", "/api/transactions/deposit") => {
            if body.contains("\"currency\":\"MAD\"") {
                send_json(&mut stream, 200, "OK", r#"{"success": true, "message": "Dépôt effectué avec succès", "data": null}"#);
            } else {
                send_json(&mut stream, 400, "Bad Request", r#"{"message": "Devise invalide"}"#);
            }
        }
        ("GET", "/api/transactions/my") => {
            if config.wrap_my_transactions {
                let wrapped = format!(r#"{{"data": {}}}"#, TRANSACTIONS);
                send_json(&mut stream, 200, "OK", &wrapped);
            } else {
                send_json(&mut stream, 200, "OK", TRANSACTIONS);
            }
        }
        ("GET", "/api/transactions/my/export") => {
            if request.to_lowercase().contains("accept: application/vnd.openxmlformats") {
                send_bytes(&mut stream, 200, "OK", b"PK\x03\x04mock-workbook");
            } else {
                send_json(&mut stream, 406, "Not Acceptable", r#"{"message": "xlsx only"}"#);
            }
        }
        _ => send_json(&mut stream, 404, "Not Found", r#"{"message": "Endpoint not found"}"#),
    }
}

/// Read headers plus a `Content-Length` body
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buffer = [0; 4096];
    loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    Some(String::from_utf8_lossy(&data).to_string())
}

fn send_bytes(stream: &mut TcpStream, status: u16, status_text: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        status_text,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn send_json(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

const LOGIN_RESPONSE: &str = r#"{
    "success": true,
    "message": "Connexion réussie",
    "data": {
        "accessToken": "valid-token",
        "refreshToken": "refresh-token",
        "tokenType": "Bearer",
        "expiresIn": 86400,
        "user": {"id": 1, "email": "admin@bank.ma", "fullName": "Admin", "role": "ADMIN", "active": true}
    }
}"#;

const USERS: &str = r#"[
    {"id": 1, "email": "admin@bank.ma", "fullName": "Admin", "role": "ADMIN", "isActive": true},
    {"id": 2, "email": "sara@bank.ma", "fullName": "Sara", "role": "USER", "isActive": true,
     "bankAccounts": [{"id": 10, "currency": "MAD", "currentBalance": 250.5}]}
]"#;

const TRANSACTIONS: &str = r#"[
    {"id": 100, "transactionRef": "TX-100", "type": "MAD_TO_RWF", "amount": 100,
     "finalAmount": 15895.45, "exchangeRate": 158.9545, "status": "COMPLETED",
     "createdAt": "2025-01-15T10:30:00", "userId": 2},
    {"id": 101, "transactionRef": "TX-101", "type": "DEPOSIT_MAD", "amount": 50,
     "status": "PENDING", "createdAt": "2025-01-16T09:00:00.123", "userId": 2}
]"#;

const AUDIT_LOGS: &str = r#"[
    {"id": 1, "userEmail": "sara@bank.ma", "actionType": "LOGIN", "entityType": "USER",
     "entityId": 2, "ipAddress": "10.0.0.2", "createdAt": "2025-01-15T10:00:00"},
    {"id": 2, "userEmail": null, "actionType": "CLEANUP", "entityType": "SYSTEM",
     "createdAt": "2025-01-15T11:00:00"}
]"#;

const CONVERTED: &str = r#"{"id": 102, "transactionRef": "TX-102", "type": "MAD_TO_RWF",
    "amount": 100, "fromCurrency": "MAD", "toCurrency": "RWF", "exchangeRate": 158.9545,
    "finalAmount": 15895.45, "status": "COMPLETED", "createdAt": "2025-01-17T08:00:00"}"#;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;

    use super::*;
    use crate::adapters::HttpBackend;
    use crate::domain::result::Error;
    use crate::domain::{
        AuditLogQuery, ConversionDirection, Currency, DepositRequest, LoginRequest, Role,
        TransactionStatus,
    };
    use crate::ports::BackendApi;

    fn backend_for(server: &MockBackendServer) -> HttpBackend {
        HttpBackend::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            email: "admin@bank.ma".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_login_success() {
        let server = MockBackendServer::start(MockConfig::default()).unwrap();
        let backend = backend_for(&server);

        let auth = backend.login(&login_request("secret1")).unwrap();
        assert_eq!(auth.usable_access_token(), Some(VALID_TOKEN));
        assert_eq!(auth.user.unwrap().role, Role::Admin);
    }

    #[test]
    fn test_login_wrong_password_is_unauthorized() {
        let server = MockBackendServer::start(MockConfig::default()).unwrap();
        let backend = backend_for(&server);

        let err = backend.login(&login_request("wrong")).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("mot de passe incorrect"));
    }

    #[test]
    fn test_login_without_token_yields_empty_response() {
        let server = MockBackendServer::start(MockConfig {
            login_without_token: true,
            ..Default::default()
        })
        .unwrap();
        let auth = backend_for(&server).login(&login_request("secret1")).unwrap();
        assert!(auth.usable_access_token().is_none());
    }

    #[test]
    fn test_admin_lists() {
        let server = MockBackendServer::start(MockConfig::default()).unwrap();
        let backend = backend_for(&server);

        let users = backend.list_users(VALID_TOKEN).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].total_balance(), Decimal::new(2505, 1));

        let txs = backend.list_transactions(VALID_TOKEN).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[1].status, TransactionStatus::Pending);

        let logs = backend.list_audit_logs(VALID_TOKEN).unwrap();
        assert_eq!(logs[1].actor(), "System");
        assert_eq!(backend.list_legacy_logs(VALID_TOKEN).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let server = MockBackendServer::start(MockConfig::default()).unwrap();
        let err = backend_for(&server).list_users("bogus").unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn test_server_error_maps_to_api_error() {
        let server = MockBackendServer::start(MockConfig {
            server_error: true,
            ..Default::default()
        })
        .unwrap();
        match backend_for(&server).list_transactions(VALID_TOKEN).unwrap_err() {
            Error::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Erreur interne");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_audit_log_search_stats_and_clear() {
        let server = MockBackendServer::start(MockConfig::default()).unwrap();
        let backend = backend_for(&server);

        let query = AuditLogQuery {
            action_type: Some("LOGIN".to_string()),
            ..Default::default()
        };
        let found = backend.search_audit_logs(VALID_TOKEN, &query).unwrap();
        assert_eq!(found[0].action_type, "actionType=LOGIN");

        let stats = backend.audit_log_stats(VALID_TOKEN).unwrap();
        assert_eq!(stats.total_logs, 2);
        assert_eq!(stats.most_common_action.as_deref(), Some("LOGIN"));

        let message = backend.clear_audit_logs(VALID_TOKEN).unwrap();
        assert_eq!(message, "All logs cleared successfully");
    }

    #[test]
    fn test_convert_and_deposit() {
        let server = MockBackendServer::start(MockConfig::default()).unwrap();
        let backend = backend_for(&server);

        let tx = backend
            .convert(VALID_TOKEN, ConversionDirection::MadToRwf, Decimal::new(10000, 2))
            .unwrap();
        assert_eq!(tx.final_amount, Some(Decimal::new(1589545, 2)));

        let err = backend
            .convert(VALID_TOKEN, ConversionDirection::RwfToMad, Decimal::new(5, 0))
            .unwrap_err();
        assert_eq!(err.to_string(), "Server error (HTTP 500): Solde insuffisant");

        let message = backend
            .deposit(
                VALID_TOKEN,
                &DepositRequest {
                    amount: Decimal::new(50, 0),
                    currency: Currency::MAD,
                },
            )
            .unwrap();
        assert_eq!(message, "Dépôt effectué avec succès");
    }

    #[test]
    fn test_my_transactions_accepts_both_shapes() {
        let bare = MockBackendServer::start(MockConfig::default()).unwrap();
        assert_eq!(backend_for(&bare).my_transactions(VALID_TOKEN).unwrap().len(), 2);

        let wrapped = MockBackendServer::start(MockConfig {
            wrap_my_transactions: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend_for(&wrapped).my_transactions(VALID_TOKEN).unwrap().len(), 2);
    }

    #[test]
    fn test_export_requests_xlsx() {
        let server = MockBackendServer::start(MockConfig::default()).unwrap();
        let bytes = backend_for(&server).export_my_transactions(VALID_TOKEN).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }

    #[test]
    fn test_session_endpoints() {
        let server = MockBackendServer::start(MockConfig::default()).unwrap();
        let backend = backend_for(&server);

        assert!(backend.verify_token(VALID_TOKEN).unwrap().valid);
        assert_eq!(backend.get_profile(VALID_TOKEN, 1).unwrap().email, "admin@bank.ma");
        backend.logout(VALID_TOKEN).unwrap();
        assert!(backend.logout("expired").unwrap_err().is_unauthorized());
        assert_eq!(
            backend.request_password_reset("sara@bank.ma").unwrap(),
            "Demande de réinitialisation envoyée"
        );
    }

    #[test]
    fn test_timeout_maps_to_network_error() {
        let server = MockBackendServer::start(MockConfig {
            delay_ms: 1500,
            ..Default::default()
        })
        .unwrap();
        let backend = HttpBackend::new(&server.base_url(), Duration::from_millis(200)).unwrap();
        let err = backend.list_users(VALID_TOKEN).unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_connection_refused_maps_to_network_error() {
        let backend = HttpBackend::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let err = backend.list_users(VALID_TOKEN).unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
