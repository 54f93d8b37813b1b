// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session id issuance and lookup.
//!
//! A session is the `session_id` column of a user row, so each user holds at
//! most one live session and issuing a new one replaces the old.
use std::sync::Arc;
use std::time::Duration;

use account_auth_common::UserId;
use chrono::Utc;
use metrics::counter;
use tracing::{debug, info};

use super::token_generator::generate_session_id;
use crate::metrics::{SESSION_CREATED, SESSION_DESTROYED};
use crate::storage::{found, StoreError, User, UserFilter, UserStore, UserUpdate};

/// Session manager backed by the identity store
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn UserStore>,
    ttl: Option<Duration>,
}

impl SessionManager {
    /// Sessions that live until destroyed
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store, ttl: None }
    }

    /// Sessions that also lapse `ttl` after issuance
    pub fn with_ttl(store: Arc<dyn UserStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Issue a fresh session id for the user with `email`
    ///
    /// Returns `None` when no such user exists.
    pub async fn create_session(&self, email: &str) -> Result<Option<String>, StoreError> {
        let Some(user) = found(self.store.find_one_by(&UserFilter::by_email(email)).await)? else {
            debug!("session requested for unknown email");
            return Ok(None);
        };

        let session_id = generate_session_id();
        let update = UserUpdate::new()
            .session_id(Some(session_id.clone()))
            .session_created_at(Some(Utc::now().timestamp()));

        match self.store.update(user.id, &update).await {
            Ok(()) => {},
            // Deleted between lookup and update
            Err(StoreError::NotFound) => return Ok(None),
            Err(err) => return Err(err),
        }

        counter!(SESSION_CREATED).increment(1);
        info!(user_id = user.id, "session created");
        Ok(Some(session_id))
    }

    /// User holding `session_id`, if any and not expired
    pub async fn resolve_session(&self, session_id: Option<&str>) -> Result<Option<User>, StoreError> {
        let Some(session_id) = session_id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let Some(user) = found(self.store.find_one_by(&UserFilter::by_session_id(session_id)).await)? else {
            return Ok(None);
        };

        if self.is_expired(&user) {
            debug!(user_id = user.id, "session expired");
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Clear the session of `user_id`; absent or unknown ids are a no-op
    pub async fn destroy_session(&self, user_id: Option<UserId>) -> Result<(), StoreError> {
        let Some(user_id) = user_id else {
            return Ok(());
        };

        let update = UserUpdate::new().session_id(None).session_created_at(None);
        match self.store.update(user_id, &update).await {
            Ok(()) => {
                counter!(SESSION_DESTROYED).increment(1);
                info!(user_id, "session destroyed");
                Ok(())
            },
            Err(StoreError::NotFound) => {
                debug!(user_id, "destroy requested for unknown user");
                Ok(())
            },
            Err(err) => Err(err),
        }
    }

    fn is_expired(&self, user: &User) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        let Some(created_at) = user.session_created_at else {
            // Issued without a timestamp; treat as expired once a TTL applies
            return true;
        };
        let age = Utc::now().timestamp().saturating_sub(created_at);
        age < 0 || age as u64 >= ttl.as_secs()
    }
}
