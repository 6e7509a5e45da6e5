//! Authentication payloads and the backend response envelope

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{amount, Currency, User};

/// Envelope wrapping most backend responses: `{ success, message, data }`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Tokens and user data returned by login, register and refresh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<User>,
}

impl AuthResponse {
    /// The access token, if present and non-blank
    pub fn usable_access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositRequest {
    #[serde(serialize_with = "amount::serialize_number")]
    pub amount: Decimal,
    pub currency: Currency,
}

/// Result of `/auth/verify-token`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenVerification {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_envelope() {
        let env: ApiEnvelope<AuthResponse> = serde_json::from_str(
            r#"{
                "success": true,
                "message": "Connexion réussie",
                "data": {
                    "accessToken": "abc",
                    "refreshToken": "def",
                    "tokenType": "Bearer",
                    "expiresIn": 86400,
                    "user": {"id": 1, "email": "a@b.ma", "role": "ADMIN", "active": true}
                }
            }"#,
        )
        .unwrap();
        let data = env.data.unwrap();
        assert_eq!(data.usable_access_token(), Some("abc"));
        assert_eq!(data.user.unwrap().email, "a@b.ma");
    }

    #[test]
    fn test_envelope_without_data() {
        let env: ApiEnvelope<String> =
            serde_json::from_str(r#"{"success": true, "message": "ok", "data": null}"#).unwrap();
        assert!(env.data.is_none());
        assert_eq!(env.message_or("fallback"), "ok");

        let bare: ApiEnvelope<String> = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(bare.message_or("fallback"), "fallback");
    }

    #[test]
    fn test_blank_token_is_not_usable() {
        let auth = AuthResponse {
            access_token: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(auth.usable_access_token().is_none());
    }

    #[test]
    fn test_deposit_request_shape() {
        let req = DepositRequest {
            amount: Decimal::new(2500, 2),
            currency: Currency::RWF,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"amount": 25.0, "currency": "RWF"}));
    }
}
