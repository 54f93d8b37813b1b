// ============================
// crates/backend-lib/src/error.rs
// ============================
//! Central error type + Axum integration.
use account_auth_common::MessageResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::warn;

use crate::auth::AuthError;
use crate::storage::StoreError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("email already registered")]
    AlreadyRegistered,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::AlreadyRegistered => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "VAL_001",
            AppError::AlreadyRegistered => "USER_001",
            AppError::Unauthorized => "AUTH_001",
            AppError::InvalidPassword => "AUTH_002",
            AppError::AuthRateLimited => "AUTH_003",
            AppError::Forbidden => "AUTH_004",
            AppError::NotFound(_) => "NF_001",
            AppError::StoreUnavailable(_) => "STORE_001",
            AppError::Timeout(_) => "TIMEOUT_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::AlreadyRegistered => "email already registered".to_string(),
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::InvalidPassword => "Authentication failed".to_string(),
            AppError::Forbidden => "Forbidden".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Timeout(_) => "The request timed out".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            warn!(code = self.error_code(), error = %self, "request failed");
        }

        // Registration clients expect a bare message body
        if let AppError::AlreadyRegistered = self {
            return (status, Json(MessageResponse::new(self.sanitized_message()))).into_response();
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("user".to_string()),
            StoreError::Timeout => AppError::Timeout("store operation".to_string()),
            StoreError::Unavailable(detail) => AppError::StoreUnavailable(detail),
            other @ (StoreError::InvalidFilter(_) | StoreError::InvalidAttribute(_) | StoreError::Conflict(_)) => {
                AppError::Internal(other.to_string())
            },
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AlreadyRegistered => AppError::AlreadyRegistered,
            AuthError::Timeout { operation } => AppError::Timeout(operation.to_string()),
            AuthError::Store(store) => store.into(),
            other @ (AuthError::Hashing(_) | AuthError::Task(_)) => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(
            AppError::InvalidInput("email missing".to_string()).to_string(),
            "Invalid input: email missing"
        );
        assert_eq!(AppError::AuthRateLimited.to_string(), "Authentication rate limit exceeded");
    }

    #[test]
    fn test_app_error_status_codes() {
        let cases = [
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AppError::AlreadyRegistered, StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::InvalidPassword, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::AuthRateLimited, StatusCode::TOO_MANY_REQUESTS),
            (AppError::StoreUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Timeout("x".into()), StatusCode::GATEWAY_TIMEOUT),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[test]
    fn test_error_from_impls() {
        assert!(matches!(AppError::from(AuthError::AlreadyRegistered), AppError::AlreadyRegistered));
        assert!(matches!(
            AppError::from(AuthError::Timeout { operation: "password hashing" }),
            AppError::Timeout(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::Store(StoreError::Unavailable("down".into()))),
            AppError::StoreUnavailable(_)
        ));
        assert!(matches!(AppError::from(StoreError::Timeout), AppError::Timeout(_)));
        assert!(matches!(AppError::from(StoreError::InvalidFilter("x".into())), AppError::Internal(_)));
        assert!(matches!(
            AppError::from(ValidationError::MissingField("email")),
            AppError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_error_body() {
        let response = AppError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "AUTH_004");
        assert_eq!(body["error"]["message"], "Forbidden");
    }

    #[tokio::test]
    async fn test_already_registered_body() {
        let response = AppError::AlreadyRegistered.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "email already registered"})
        );
    }
}
