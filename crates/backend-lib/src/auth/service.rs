// ============================
// crates/backend-lib/src/auth/service.rs
// ============================
//! Authentication façade used by the HTTP layer.
use std::sync::Arc;
use std::time::Duration;

use account_auth_common::UserId;
use metrics::counter;
use tracing::{debug, info, instrument};

use super::password::CredentialHasher;
use super::policy::{AuthPolicy, DEFAULT_EXCLUDED_PATHS};
use super::session::SessionManager;
use super::strategy::{AuthRequest, AuthStrategy, BasicAuthStrategy, SessionAuthStrategy, StrategyKind};
use super::AuthError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, USER_REGISTERED};
use crate::storage::{found, StoreError, User, UserFilter, UserStore};

/// Default bound on one hash or verify call
pub const DEFAULT_HASH_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for [`Authenticator::new`]
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub strategy: StrategyKind,
    pub excluded_paths: Vec<String>,
    pub session_ttl: Option<Duration>,
    pub hash_timeout: Duration,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
            session_ttl: None,
            hash_timeout: DEFAULT_HASH_TIMEOUT,
        }
    }
}

/// Result of a login attempt
#[derive(Debug)]
pub enum LoginOutcome {
    LoggedIn { user: User, session_id: String },
    UnknownEmail,
    WrongPassword,
}

impl LoginOutcome {
    fn reason(&self) -> &'static str {
        match self {
            LoginOutcome::LoggedIn { .. } => "ok",
            LoginOutcome::UnknownEmail => "unknown_email",
            LoginOutcome::WrongPassword => "wrong_password",
        }
    }
}

/// Composes hashing, the identity store, sessions and the path policy
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    sessions: SessionManager,
    policy: AuthPolicy,
    strategy: Arc<dyn AuthStrategy>,
    hash_timeout: Duration,
}

impl Authenticator {
    pub fn new(store: Arc<dyn UserStore>, hasher: CredentialHasher, options: AuthOptions) -> Self {
        let sessions = SessionManager::with_ttl(store.clone(), options.session_ttl);
        let strategy: Arc<dyn AuthStrategy> = match options.strategy {
            StrategyKind::Basic => Arc::new(BasicAuthStrategy::new(
                store.clone(),
                hasher.clone(),
                options.hash_timeout,
            )),
            StrategyKind::Session => Arc::new(SessionAuthStrategy::new(sessions.clone())),
        };

        Self {
            store,
            hasher,
            sessions,
            policy: AuthPolicy::new(&options.excluded_paths),
            strategy,
            hash_timeout: options.hash_timeout,
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    pub fn requires_auth(&self, path: Option<&str>) -> bool {
        self.policy.requires_auth(path)
    }

    /// Identity behind `request` under the configured strategy
    pub async fn current_user(&self, request: &AuthRequest) -> Result<Option<User>, AuthError> {
        self.strategy.resolve_identity(request).await
    }

    /// Create an account; a taken email yields [`AuthError::AlreadyRegistered`]
    #[instrument(skip_all)]
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if found(self.store.find_one_by(&UserFilter::by_email(email)).await)?.is_some() {
            debug!("registration for a taken email");
            return Err(AuthError::AlreadyRegistered);
        }

        let hashed = self.hasher.hash_blocking(password, self.hash_timeout).await?;
        let user = match self.store.add(email, &hashed).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration
            Err(StoreError::Conflict(_)) => return Err(AuthError::AlreadyRegistered),
            Err(err) => return Err(err.into()),
        };

        counter!(USER_REGISTERED).increment(1);
        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Whether `email` names a user whose password is `password`
    pub async fn valid_login(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        Ok(self.check_password(email, password).await?.is_some_and(|(_, valid)| valid))
    }

    /// Verify credentials and open a session
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let outcome = match self.check_password(email, password).await? {
            None => LoginOutcome::UnknownEmail,
            Some((_, false)) => LoginOutcome::WrongPassword,
            Some((user, true)) => match self.sessions.create_session(&user.email).await? {
                Some(session_id) => LoginOutcome::LoggedIn { user, session_id },
                None => LoginOutcome::UnknownEmail,
            },
        };

        match &outcome {
            LoginOutcome::LoggedIn { user, .. } => {
                counter!(LOGIN_SUCCEEDED).increment(1);
                info!(user_id = user.id, "user logged in");
            },
            rejected => {
                counter!(LOGIN_FAILED, "reason" => rejected.reason()).increment(1);
                debug!(reason = rejected.reason(), "login rejected");
            },
        }
        Ok(outcome)
    }

    pub async fn create_session(&self, email: &str) -> Result<Option<String>, AuthError> {
        Ok(self.sessions.create_session(email).await?)
    }

    pub async fn user_from_session(&self, session_id: Option<&str>) -> Result<Option<User>, AuthError> {
        Ok(self.sessions.resolve_session(session_id).await?)
    }

    pub async fn destroy_session(&self, user_id: Option<UserId>) -> Result<(), AuthError> {
        Ok(self.sessions.destroy_session(user_id).await?)
    }

    /// End the session named by `session_id`
    ///
    /// Returns `false` when it names no active session.
    #[instrument(skip_all)]
    pub async fn logout(&self, session_id: Option<&str>) -> Result<bool, AuthError> {
        let Some(user) = self.user_from_session(session_id).await? else {
            debug!("logout without an active session");
            return Ok(false);
        };
        self.destroy_session(Some(user.id)).await?;
        info!(user_id = user.id, "user logged out");
        Ok(true)
    }

    pub async fn find_user(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(found(self.store.find_one_by(&UserFilter::by_id(user_id)).await)?)
    }

    async fn check_password(&self, email: &str, password: &str) -> Result<Option<(User, bool)>, AuthError> {
        let Some(user) = found(self.store.find_one_by(&UserFilter::by_email(email)).await)? else {
            return Ok(None);
        };
        let valid = self
            .hasher
            .verify_blocking(&user.hashed_password, password, self.hash_timeout)
            .await?;
        Ok(Some((user, valid)))
    }
}
