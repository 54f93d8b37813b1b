// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{normalize_path::NormalizePath, trace::TraceLayer};

use crate::handlers::{index, session, users};
use crate::middleware::authenticate;
use crate::AppState;

/// Prefix of every API route
pub const API_PREFIX: &str = "/api/v1";

/// Router behind trailing-slash normalization
pub type App = NormalizePath<Router>;

/// Create the application router
///
/// `/api/v1/status/` and `/api/v1/status` reach the same handler.
pub fn create_router(state: Arc<AppState>) -> App {
    let api = Router::new()
        .route("/status", get(index::status))
        .route("/unauthorized", get(index::unauthorized))
        .route("/forbidden", get(index::forbidden))
        .route("/users", post(users::register))
        .route("/users/{user_id}", get(users::show))
        .route("/auth_session/login", post(session::login))
        .route("/auth_session/logout", delete(session::logout));

    let router = Router::new()
        .route("/", get(index::index))
        .nest(API_PREFIX, api)
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    NormalizePath::trim_trailing_slash(router)
}
