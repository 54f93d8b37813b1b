// ============================
// crates/backend-lib/src/middleware/authenticate.rs
// ============================
//! Request authentication gate.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::debug;

use crate::auth::AuthRequest;
use crate::metrics::REQUEST_REJECTED;
use crate::storage::User;
use crate::{error::AppError, AppState};

/// Identity resolved for the current request; `None` on exempt paths
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

/// Authentication gate applied to every route
///
/// Requests carrying neither an Authorization header nor the session cookie
/// are rejected with 401, and credentials that resolve to nobody with 403.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.authenticator.requires_auth(Some(request.uri().path())) {
        request.extensions_mut().insert(CurrentUser(None));
        return Ok(next.run(request).await);
    }

    let auth_request = AuthRequest::from_headers(request.headers(), state.session_cookie_name());
    if !auth_request.has_credentials() {
        counter!(REQUEST_REJECTED, "reason" => "unauthorized").increment(1);
        debug!(path = request.uri().path(), "request without credentials");
        return Err(AppError::Unauthorized);
    }

    let Some(user) = state.authenticator.current_user(&auth_request).await? else {
        counter!(REQUEST_REJECTED, "reason" => "forbidden").increment(1);
        debug!(path = request.uri().path(), "credentials resolve to no user");
        return Err(AppError::Forbidden);
    };

    request.extensions_mut().insert(CurrentUser(Some(user)));
    Ok(next.run(request).await)
}
