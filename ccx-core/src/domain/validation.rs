//! Form input checks run before any request is sent

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::result::{Error, Result};
use super::RegisterRequest;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

fn check_password_length(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> Result<()> {
    if is_blank(email) || is_blank(password) {
        return Err(Error::validation("Please fill in all fields"));
    }
    Ok(())
}

pub fn validate_registration(request: &RegisterRequest) -> Result<()> {
    if [
        &request.email,
        &request.password,
        &request.full_name,
        &request.phone_number,
    ]
    .iter()
    .any(|field| is_blank(field))
    {
        return Err(Error::validation("All fields are required"));
    }
    check_password_length(&request.password)?;
    if !is_valid_email(&request.email) {
        return Err(Error::validation("Please enter a valid email"));
    }
    Ok(())
}

pub fn validate_reset_request(email: &str) -> Result<()> {
    if is_blank(email) {
        return Err(Error::validation("Please enter your email address"));
    }
    if !is_valid_email(email) {
        return Err(Error::validation("Please enter a valid email"));
    }
    Ok(())
}

pub fn validate_password_reset(token: &str, new_password: &str, confirm: &str) -> Result<()> {
    if is_blank(new_password) || is_blank(confirm) {
        return Err(Error::validation("Please fill in all fields"));
    }
    check_password_length(new_password)?;
    if new_password != confirm {
        return Err(Error::validation("Passwords do not match"));
    }
    if is_blank(token) {
        return Err(Error::validation("Invalid reset link"));
    }
    Ok(())
}

pub fn validate_password_change(old_password: &str, new_password: &str) -> Result<()> {
    if is_blank(old_password) || is_blank(new_password) {
        return Err(Error::validation("Please fill in all fields"));
    }
    check_password_length(new_password)
}

/// Amounts must be strictly positive
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("Amount must be greater than zero"));
    }
    Ok(())
}

/// Parse a user-typed amount; accepts a comma as decimal separator
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let normalized = input.trim().replace(',', ".");
    let amount = normalized
        .parse::<Decimal>()
        .map_err(|_| Error::validation(format!("Invalid amount: '{}'", input.trim())))?;
    validate_amount(amount)?;
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            email: "sara@example.ma".to_string(),
            password: "secret1".to_string(),
            full_name: "Sara Idrissi".to_string(),
            phone_number: "0612345678".to_string(),
        }
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        assert!(validate_login("a@b.co", "pw").is_ok());
        assert!(validate_login("  ", "pw").is_err());
        assert!(validate_login("a@b.co", "").is_err());
    }

    #[test]
    fn test_registration_rules() {
        assert!(validate_registration(&registration()).is_ok());

        let mut short = registration();
        short.password = "12345".to_string();
        assert!(validate_registration(&short).unwrap_err().to_string().contains("at least 6"));

        let mut bad_email = registration();
        bad_email.email = "sara.example.ma".to_string();
        assert!(validate_registration(&bad_email).is_err());

        let mut missing_phone = registration();
        missing_phone.phone_number = " ".to_string();
        assert!(validate_registration(&missing_phone).is_err());
    }

    #[test]
    fn test_password_reset_rules() {
        assert!(validate_password_reset("tok", "secret1", "secret1").is_ok());
        assert!(validate_password_reset("tok", "secret1", "secret2").is_err());
        assert!(validate_password_reset("tok", "abc", "abc").is_err());
        assert!(validate_password_reset("", "secret1", "secret1").is_err());
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount("100").unwrap(), Decimal::new(100, 0));
        assert_eq!(parse_amount(" 12,5 ").unwrap(), Decimal::new(125, 1));
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("abc").is_err());
    }
}
