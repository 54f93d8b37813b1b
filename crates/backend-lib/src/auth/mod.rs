// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod credentials;
mod error;
pub mod password;
pub mod policy;
pub mod rate_limit;
mod service;
pub mod session;
pub mod strategy;
pub mod token_generator;

pub use credentials::Credentials;
pub use error::AuthError;
pub use password::{verify_password, CredentialHasher, HashAlgorithm, HashedPassword};
pub use policy::{requires_auth, AuthPolicy, ExclusionRule, DEFAULT_EXCLUDED_PATHS};
pub use rate_limit::LoginThrottle;
pub use service::{AuthOptions, Authenticator, LoginOutcome, DEFAULT_HASH_TIMEOUT};
pub use session::SessionManager;
pub use strategy::{AuthRequest, AuthStrategy, BasicAuthStrategy, SessionAuthStrategy, StrategyKind, DEFAULT_SESSION_COOKIE};
