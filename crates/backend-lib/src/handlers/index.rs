// ============================
// crates/backend-lib/src/handlers/index.rs
// ============================
//! Public routes and fixed-status responses.
use account_auth_common::{MessageResponse, StatusResponse};
use axum::Json;

use crate::error::AppError;

pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse::new("Bienvenue"))
}

pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse::default())
}

/// Always 401; lets clients exercise the error contract
pub async fn unauthorized() -> AppError {
    AppError::Unauthorized
}

/// Always 403
pub async fn forbidden() -> AppError {
    AppError::Forbidden
}
