// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Registration and user lookup.
use std::sync::Arc;

use account_auth_common::{CredentialsForm, RegisteredResponse, UserId, UserView};
use axum::{
    extract::{rejection::FormRejection, Path, State},
    Extension, Form, Json,
};

use crate::middleware::CurrentUser;
use crate::handlers::form_fields;
use crate::validation::validate_registration;
use crate::{error::AppError, AppState};

/// Id segment naming the caller
pub const ME: &str = "me";

/// `POST /api/v1/users`
pub async fn register(
    State(state): State<Arc<AppState>>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Json<RegisteredResponse>, AppError> {
    let form = form_fields(form);
    let (email, password) = validate_registration(&form)?;
    let user = state.authenticator.register(email, password).await?;
    Ok(Json(RegisteredResponse::new(user.email)))
}

/// `GET /api/v1/users/{user_id}`, where `me` is the caller
pub async fn show(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> Result<Json<UserView>, AppError> {
    let user = if user_id == ME {
        current
    } else {
        match user_id.parse::<UserId>() {
            Ok(id) => state.authenticator.find_user(id).await?,
            Err(_) => None,
        }
    };

    user.map(|user| Json(user.view()))
        .ok_or_else(|| AppError::NotFound("user".to_string()))
}
