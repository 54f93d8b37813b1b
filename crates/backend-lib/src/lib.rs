// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the account authentication service.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::auth::{Authenticator, LoginThrottle};
use crate::config::{DatabaseBackend, DatabaseSettings, Settings};
use crate::storage::{MemoryUserStore, SqliteUserStore, UserStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication façade
    pub authenticator: Authenticator,
    /// Settings the service was started with
    pub settings: Arc<Settings>,
    /// Wrong-password throttle
    pub login_throttle: LoginThrottle,
}

impl AppState {
    /// Create a new application state over an open store
    pub fn new(store: Arc<dyn UserStore>, settings: Settings) -> anyhow::Result<Self> {
        let hasher = settings.build_hasher()?;
        let authenticator = Authenticator::new(store, hasher, settings.auth_options());
        let login_throttle = settings.login_throttle();

        Ok(Self {
            authenticator,
            settings: Arc::new(settings),
            login_throttle,
        })
    }

    /// Open the configured store and build the state around it
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let store = open_store(&settings.database)?;
        Self::new(store, settings)
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.settings.auth.session_cookie_name
    }
}

/// Open the identity store named by `database`
pub fn open_store(database: &DatabaseSettings) -> anyhow::Result<Arc<dyn UserStore>> {
    match database.backend {
        DatabaseBackend::Memory => {
            info!("using in-memory identity store");
            Ok(Arc::new(MemoryUserStore::new()))
        },
        DatabaseBackend::Sqlite => {
            if let Some(parent) = database.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let store = SqliteUserStore::open(
                &database.path,
                Duration::from_millis(database.busy_timeout_ms),
                Duration::from_millis(database.operation_timeout_ms),
            )
            .with_context(|| format!("failed to open {}", database.path.display()))?;
            info!(path = %database.path.display(), "opened sqlite identity store");
            Ok(Arc::new(store))
        },
    }
}
