// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! exchanged between the account authentication service and its clients.
//! Form bodies are URL-encoded; responses are JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier as assigned by the identity store
pub type UserId = i64;

/// Form fields posted to the registration and login endpoints
///
/// Both fields are optional so that a missing field can be reported
/// instead of rejected by the extractor.
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct CredentialsForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for CredentialsForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsForm")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Public representation of a user account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
}

/// Body returned after a successful registration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisteredResponse {
    pub email: String,
    pub message: String,
}

impl RegisteredResponse {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            message: "user created".to_string(),
        }
    }
}

/// Plain `{"message": ...}` body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl Default for StatusResponse {
    fn default() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_form_debug_hides_password() {
        let form = CredentialsForm {
            email: Some("bob@example.com".to_string()),
            password: Some("hunter2".to_string()),
        };
        let printed = format!("{form:?}");
        assert!(printed.contains("bob@example.com"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_registered_response_shape() {
        let body = serde_json::to_value(RegisteredResponse::new("a@b.com")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"email": "a@b.com", "message": "user created"})
        );
    }

    #[test]
    fn test_credentials_form_missing_fields() {
        let form: CredentialsForm = serde_json::from_str(r#"{"email": "a@b.com"}"#).unwrap();
        assert_eq!(form.email.as_deref(), Some("a@b.com"));
        assert!(form.password.is_none());
    }
}
