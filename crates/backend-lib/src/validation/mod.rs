// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Form validation module.

use account_auth_common::CredentialsForm;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

static EMAIL_REGEX: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} missing")]
    MissingField(&'static str),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Present, non-blank form field
pub fn require_field<'a>(name: &'static str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ValidationError::MissingField(name)),
    }
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    let well_formed = match &*EMAIL_REGEX {
        Ok(pattern) => pattern.is_match(email),
        Err(_) => false,
    };
    if !well_formed {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a password
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(password)
}

/// Email and password of a registration form
pub fn validate_registration(form: &CredentialsForm) -> ValidationResult<(&str, &str)> {
    let email = require_field("email", form.email.as_deref())?.trim();
    let password = require_field("password", form.password.as_deref())?;
    Ok((validate_email(email)?, validate_password(password)?))
}

/// Email and password of a login form
///
/// Only presence is checked; a malformed email simply matches no user.
pub fn validate_login(form: &CredentialsForm) -> ValidationResult<(&str, &str)> {
    let email = require_field("email", form.email.as_deref())?.trim();
    let password = require_field("password", form.password.as_deref())?;
    Ok((email, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: Option<&str>, password: Option<&str>) -> CredentialsForm {
        CredentialsForm {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_email() {
        // Valid emails
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());

        // Invalid email (no @)
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));

        // Invalid email (no domain)
        assert!(matches!(
            validate_email("test@"),
            Err(ValidationError::InvalidEmail(_))
        ));

        // Invalid email (no TLD)
        assert!(matches!(
            validate_email("test@example"),
            Err(ValidationError::InvalidEmail(_))
        ));

        let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_require_field() {
        assert_eq!(require_field("email", Some("a")), Ok("a"));
        assert_eq!(require_field("email", None), Err(ValidationError::MissingField("email")));
        assert_eq!(require_field("email", Some("  ")), Err(ValidationError::MissingField("email")));
        assert_eq!(ValidationError::MissingField("password").to_string(), "password missing");
    }

    #[test]
    fn test_validate_registration() {
        assert_eq!(
            validate_registration(&form(Some(" a@b.com "), Some("pw123"))),
            Ok(("a@b.com", "pw123"))
        );
        assert_eq!(
            validate_registration(&form(None, Some("pw123"))),
            Err(ValidationError::MissingField("email"))
        );
        assert_eq!(
            validate_registration(&form(Some("a@b.com"), None)),
            Err(ValidationError::MissingField("password"))
        );
        assert!(matches!(
            validate_registration(&form(Some("not-an-email"), Some("pw"))),
            Err(ValidationError::InvalidEmail(_))
        ));
        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(
            validate_registration(&form(Some("a@b.com"), Some(&long))),
            Err(ValidationError::InvalidPassword(_))
        ));
    }

    #[test]
    fn test_validate_login() {
        // Format is not checked on login
        assert_eq!(validate_login(&form(Some("whoever"), Some("pw"))), Ok(("whoever", "pw")));
        assert_eq!(validate_login(&form(Some(""), Some("pw"))), Err(ValidationError::MissingField("email")));
        assert_eq!(validate_login(&form(Some("a@b.com"), Some(""))), Err(ValidationError::MissingField("password")));
    }
}
