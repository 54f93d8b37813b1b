// ============================
// crates/backend-lib/src/auth/strategy.rs
// ============================
//! Per-request identity resolution.
//!
//! Each strategy runs a fail-fast chain: the first stage that yields nothing
//! rejects the request with `Ok(None)`. Only infrastructure failures are
//! returned as errors.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::credentials::Credentials;
use super::password::CredentialHasher;
use super::session::SessionManager;
use super::AuthError;
use crate::storage::{found, User, UserFilter, UserStore};

/// Cookie holding the session id unless configured otherwise
pub const DEFAULT_SESSION_COOKIE: &str = "_my_session_id";

/// Authentication inputs taken from one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequest {
    pub authorization: Option<String>,
    pub session_cookie: Option<String>,
}

impl AuthRequest {
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let session_cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| cookie_value(value, cookie_name))
            .map(str::to_string);

        Self {
            authorization,
            session_cookie,
        }
    }

    /// Whether the request carries any credential at all
    pub fn has_credentials(&self) -> bool {
        self.authorization.is_some() || self.session_cookie.is_some()
    }
}

/// Value of cookie `name` in a `Cookie` header
pub fn cookie_value<'a>(header_value: &'a str, name: &str) -> Option<&'a str> {
    header_value
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

/// Strategy selected by `auth.strategy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[serde(alias = "basic_auth")]
    Basic,
    #[default]
    #[serde(alias = "session_auth")]
    Session,
}

/// One way of establishing who sent a request
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn resolve_identity(&self, request: &AuthRequest) -> Result<Option<User>, AuthError>;
}

/// Authorization: Basic base64(email:password)
pub struct BasicAuthStrategy {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    hash_timeout: Duration,
}

impl BasicAuthStrategy {
    pub fn new(store: Arc<dyn UserStore>, hasher: CredentialHasher, hash_timeout: Duration) -> Self {
        Self {
            store,
            hasher,
            hash_timeout,
        }
    }
}

#[async_trait]
impl AuthStrategy for BasicAuthStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Basic
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn resolve_identity(&self, request: &AuthRequest) -> Result<Option<User>, AuthError> {
        let Some(credentials) = Credentials::from_authorization(request.authorization.as_deref()) else {
            debug!("no usable basic credentials");
            return Ok(None);
        };

        let Some(user) = found(self.store.find_one_by(&UserFilter::by_email(&credentials.email)).await)? else {
            debug!("basic credentials name an unknown email");
            return Ok(None);
        };

        let valid = self
            .hasher
            .verify_blocking(&user.hashed_password, &credentials.password, self.hash_timeout)
            .await?;
        if !valid {
            debug!(user_id = user.id, "basic credentials carry a wrong password");
            return Ok(None);
        }
        Ok(Some(user))
    }
}

/// Session id carried in a cookie
pub struct SessionAuthStrategy {
    sessions: SessionManager,
}

impl SessionAuthStrategy {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl AuthStrategy for SessionAuthStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Session
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn resolve_identity(&self, request: &AuthRequest) -> Result<Option<User>, AuthError> {
        let user = self.sessions.resolve_session(request.session_cookie.as_deref()).await?;
        if user.is_none() {
            debug!("session cookie resolves to no user");
        }
        Ok(user)
    }
}
