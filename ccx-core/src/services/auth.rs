//! Authentication service - login, logout, refresh and account recovery
//!
//! Owns the session lifecycle. Other services reach the session only
//! through [`AuthService::require_session`] and [`AuthService::require_admin`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::validation;
use crate::domain::{
    ChangePasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, Session, TokenVerification, User,
};
use crate::ports::{BackendApi, SessionStore};

/// What happened to the backend side of a logout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLogout {
    /// The backend acknowledged the logout
    Acknowledged,
    /// The call failed; the local session was cleared anyway
    Failed(String),
    /// There was no session to log out
    Skipped,
}

/// Result of a logout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub had_session: bool,
    pub remote: RemoteLogout,
}

/// Service for authentication and session management
pub struct AuthService {
    backend: Arc<dyn BackendApi>,
    store: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(backend: Arc<dyn BackendApi>, store: Arc<dyn SessionStore>) -> Self {
        Self { backend, store }
    }

    /// Log in and store the session
    ///
    /// The session is stored only when the backend returns a non-empty
    /// access token.
    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        validation::validate_login(email, password)?;

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.backend.login(&request)?;

        let session = Session::from_auth_response(&response, &request.email, Utc::now())
            .ok_or_else(|| Error::session("Login failed: no token received"))?;
        self.store.save(&session)?;
        debug!("session stored for user id {:?}", session.user_id);

        Ok(session)
    }

    /// Create an account; does not log the user in
    pub fn register(&self, request: &RegisterRequest) -> Result<()> {
        validation::validate_registration(request)?;
        let trimmed = RegisterRequest {
            email: request.email.trim().to_string(),
            password: request.password.clone(),
            full_name: request.full_name.trim().to_string(),
            phone_number: request.phone_number.trim().to_string(),
        };
        self.backend.register(&trimmed)?;
        Ok(())
    }

    /// Log out remotely (best effort) and always clear the local session
    pub fn logout(&self) -> Result<LogoutOutcome> {
        let session = match self.store.load() {
            Ok(s) => s,
            Err(e) => {
                warn!("discarding unreadable session: {}", e);
                None
            }
        };

        let remote = match &session {
            Some(s) => match self.backend.logout(&s.access_token) {
                Ok(()) => RemoteLogout::Acknowledged,
                Err(e) => {
                    warn!("backend logout failed: {}", e);
                    RemoteLogout::Failed(e.to_string())
                }
            },
            None => RemoteLogout::Skipped,
        };

        self.store.clear()?;

        Ok(LogoutOutcome {
            had_session: session.is_some(),
            remote,
        })
    }

    /// Exchange the refresh token for a new session
    pub fn refresh(&self) -> Result<Session> {
        let current = self
            .store
            .load()?
            .ok_or_else(|| Error::session("Not logged in. Run 'ccx login' first."))?;
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or_else(|| Error::session("No refresh token stored. Please log in again."))?;

        let response = self
            .backend
            .refresh_token(&RefreshTokenRequest { refresh_token })?;

        let mut session = Session::from_auth_response(&response, &current.email, Utc::now())
            .ok_or_else(|| Error::session("Refresh failed: no token received"))?;
        if response.user.is_none() {
            session.user_id = current.user_id;
            session.full_name = current.full_name.clone();
            session.role = current.role;
        }
        if session.refresh_token.is_none() {
            session.refresh_token = current.refresh_token;
        }

        self.store.save(&session)?;
        Ok(session)
    }

    pub fn request_password_reset(&self, email: &str) -> Result<String> {
        validation::validate_reset_request(email)?;
        self.backend.request_password_reset(email.trim())
    }

    pub fn reset_password(&self, token: &str, new_password: &str, confirm: &str) -> Result<String> {
        validation::validate_password_reset(token, new_password, confirm)?;
        self.backend.reset_password(&ResetPasswordRequest {
            token: token.trim().to_string(),
            new_password: new_password.to_string(),
            confirm_password: confirm.to_string(),
        })
    }

    pub fn change_password(&self, old_password: &str, new_password: &str) -> Result<String> {
        validation::validate_password_change(old_password, new_password)?;
        let session = self.require_session()?;
        let user_id = session
            .user_id
            .ok_or_else(|| Error::session("Session has no user id. Please log in again."))?;
        self.backend.change_password(
            &session.access_token,
            user_id,
            &ChangePasswordRequest {
                old_password: old_password.to_string(),
                new_password: new_password.to_string(),
            },
        )
    }

    /// Ask the backend whether `token` is accepted
    ///
    /// A rejected token is reported as `valid: false`, not as an error.
    pub fn verify_token(&self, token: &str) -> Result<TokenVerification> {
        if token.trim().is_empty() {
            return Err(Error::validation("Token is empty"));
        }
        match self.backend.verify_token(token.trim()) {
            Ok(v) => Ok(v),
            Err(Error::Unauthorized(message)) => Ok(TokenVerification {
                valid: false,
                message: Some(message),
                expires_in: None,
            }),
            Err(e) => Err(e),
        }
    }

    /// Profile of the logged-in user
    pub fn profile(&self) -> Result<User> {
        let session = self.require_session()?;
        let user_id = session
            .user_id
            .ok_or_else(|| Error::session("Session has no user id. Please log in again."))?;
        self.backend.get_profile(&session.access_token, user_id)
    }

    /// Stored session, if any
    pub fn current(&self) -> Result<Option<Session>> {
        self.store.load()
    }

    /// Stored, unexpired session
    pub fn require_session(&self) -> Result<Session> {
        let session = self
            .store
            .load()?
            .ok_or_else(|| Error::session("Not logged in. Run 'ccx login' first."))?;
        if session.is_expired(Utc::now()) {
            return Err(Error::session(
                "Session expired. Run 'ccx refresh' or log in again.",
            ));
        }
        Ok(session)
    }

    /// Stored, unexpired session belonging to an administrator
    pub fn require_admin(&self) -> Result<Session> {
        let session = self.require_session()?;
        if !session.is_admin() {
            return Err(Error::Unauthorized(
                "Administrator access required".to_string(),
            ));
        }
        Ok(session)
    }
}
