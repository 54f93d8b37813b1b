// ============================
// crates/backend-lib/src/handlers/session.rs
// ============================
//! Session login and logout.
use std::sync::Arc;

use account_auth_common::CredentialsForm;
use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Form, Json,
};
use metrics::counter;

use crate::auth::{AuthRequest, LoginOutcome};
use crate::metrics::LOGIN_FAILED;
use crate::handlers::form_fields;
use crate::validation::validate_login;
use crate::{error::AppError, AppState};

/// `Set-Cookie` value carrying a session id
pub fn session_cookie(name: &str, session_id: &str) -> String {
    format!("{name}={session_id}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value removing the session cookie
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// `POST /api/v1/auth_session/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = form_fields(form);
    let (email, password) = validate_login(&form)?;

    if !state.login_throttle.check(email) {
        counter!(LOGIN_FAILED, "reason" => "throttled").increment(1);
        return Err(AppError::AuthRateLimited);
    }

    match state.authenticator.login(email, password).await? {
        LoginOutcome::LoggedIn { user, session_id } => {
            state.login_throttle.record_success(email);
            let cookie = session_cookie(state.session_cookie_name(), &session_id);
            Ok(([(header::SET_COOKIE, cookie)], Json(user.view())).into_response())
        },
        LoginOutcome::UnknownEmail => Err(AppError::NotFound("no user found for this email".to_string())),
        LoginOutcome::WrongPassword => {
            state.login_throttle.record_failure(email);
            Err(AppError::InvalidPassword)
        },
    }
}

/// `DELETE /api/v1/auth_session/logout`
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response, AppError> {
    let request = AuthRequest::from_headers(&headers, state.session_cookie_name());
    if !state.authenticator.logout(request.session_cookie.as_deref()).await? {
        return Err(AppError::NotFound("no active session".to_string()));
    }

    let cookie = expired_cookie(state.session_cookie_name());
    Ok(([(header::SET_COOKIE, cookie)], Json(serde_json::json!({}))).into_response())
}
