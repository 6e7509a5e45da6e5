//! Client session persisted between invocations

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthResponse, Role};

/// Authenticated session: tokens plus the few user fields the client displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from an auth response
    ///
    /// Returns `None` unless the response carries a non-blank access token.
    /// `email` is used when the response has no embedded user.
    pub fn from_auth_response(
        response: &AuthResponse,
        email: &str,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let access_token = response.usable_access_token()?.to_string();
        let user = response.user.as_ref();

        Some(Self {
            access_token,
            refresh_token: response
                .refresh_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
            user_id: user.map(|u| u.id),
            email: user
                .map(|u| u.email.clone())
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| email.to_string()),
            full_name: user.and_then(|u| u.full_name.clone()),
            role: user.map(|u| u.role).unwrap_or_default(),
            created_at: now,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Expiry from the `exp` claim when the access token is a JWT
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let payload = self.access_token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        let exp = claims.get("exp")?.as_i64()?;
        DateTime::from_timestamp(exp, 0)
    }

    /// Opaque tokens never expire client-side
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|exp| exp <= now).unwrap_or(false)
    }

    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use chrono::TimeZone;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"a@b.ma","exp":{}}}"#, exp));
        format!("{}.{}.signature", header, claims)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_from_auth_response_requires_token() {
        let mut response = AuthResponse::default();
        assert!(Session::from_auth_response(&response, "a@b.ma", now()).is_none());

        response.access_token = Some(String::new());
        assert!(Session::from_auth_response(&response, "a@b.ma", now()).is_none());

        response.access_token = Some("opaque".to_string());
        let session = Session::from_auth_response(&response, "a@b.ma", now()).unwrap();
        assert_eq!(session.email, "a@b.ma");
        assert_eq!(session.role, Role::User);
        assert!(!session.is_admin());
    }

    #[test]
    fn test_from_auth_response_copies_user() {
        let user: User = serde_json::from_str(
            r#"{"id": 5, "email": "admin@bank.ma", "fullName": "Admin", "role": "ADMIN"}"#,
        )
        .unwrap();
        let response = AuthResponse {
            access_token: Some("tok".to_string()),
            refresh_token: Some("ref".to_string()),
            user: Some(user),
            ..Default::default()
        };
        let session = Session::from_auth_response(&response, "typed@bank.ma", now()).unwrap();
        assert_eq!(session.user_id, Some(5));
        assert_eq!(session.email, "admin@bank.ma");
        assert_eq!(session.refresh_token.as_deref(), Some("ref"));
        assert!(session.is_admin());
        assert_eq!(session.display_name(), "Admin");
    }

    #[test]
    fn test_jwt_expiry() {
        let response = AuthResponse {
            access_token: Some(jwt_with_exp(now().timestamp() - 60)),
            ..Default::default()
        };
        let session = Session::from_auth_response(&response, "a@b.ma", now()).unwrap();
        assert!(session.expires_at().is_some());
        assert!(session.is_expired(now()));

        let fresh = Session {
            access_token: jwt_with_exp(now().timestamp() + 3600),
            ..session
        };
        assert!(!fresh.is_expired(now()));
    }

    #[test]
    fn test_opaque_token_never_expires() {
        let response = AuthResponse {
            access_token: Some("not-a-jwt".to_string()),
            ..Default::default()
        };
        let session = Session::from_auth_response(&response, "a@b.ma", now()).unwrap();
        assert!(session.expires_at().is_none());
        assert!(!session.is_expired(now()));
    }
}
