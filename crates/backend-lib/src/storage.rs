// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Identity store abstraction with SQLite and in-memory implementations.
use async_trait::async_trait;
use thiserror::Error;

use account_auth_common::UserId;

use crate::auth::HashedPassword;

pub mod memory;
pub mod model;
pub mod sqlite;

pub use memory::MemoryUserStore;
pub use model::{FieldValue, User, UserField, UserFilter, UserUpdate};
pub use sqlite::SqliteUserStore;

/// Errors raised by identity store backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no user matches the filter")]
    NotFound,

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("constraint violated: {0}")]
    Conflict(String),

    #[error("store operation timed out")]
    Timeout,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether this is an infrastructure failure rather than a lookup miss
    /// or a programming error
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, StoreError::Timeout | StoreError::Unavailable(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(message.clone().unwrap_or_else(|| failure.to_string()))
            },
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Persistence boundary for user records
///
/// Implementations must make `update` atomic with respect to its own lookup:
/// concurrent updates of one user are applied in some serial order.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First user matching `filter`, in ascending id order
    async fn find_one_by(&self, filter: &UserFilter) -> Result<User, StoreError>;

    /// Every user matching `filter`, in ascending id order
    async fn find_all_by(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;

    /// Insert a new user and return it with its assigned id
    async fn add(&self, email: &str, hashed_password: &HashedPassword) -> Result<User, StoreError>;

    /// Apply a partial update to an existing user
    async fn update(&self, user_id: UserId, update: &UserUpdate) -> Result<(), StoreError>;
}

/// Turn a lookup miss into `None`, keeping every other error
pub fn found<T>(result: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}
