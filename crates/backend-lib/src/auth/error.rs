// ============================
// crates/backend-lib/src/auth/error.rs
// ============================
//! Authentication errors.
use thiserror::Error;

use crate::storage::StoreError;

/// Failures of the authentication façade
///
/// Rejected credentials are not errors; they surface as `None` or a
/// [`super::LoginOutcome`] variant.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("email already registered")]
    AlreadyRegistered,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("blocking task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Whether the failure lies outside this service's control
    pub fn is_infrastructure(&self) -> bool {
        match self {
            AuthError::Timeout { .. } | AuthError::Task(_) => true,
            AuthError::Store(err) => err.is_infrastructure(),
            AuthError::AlreadyRegistered | AuthError::Hashing(_) => false,
        }
    }
}
