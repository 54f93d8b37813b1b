// ============================
// crates/backend-lib/src/middleware/mod.rs
// ============================
//! Middleware for the account authentication service.

pub mod authenticate;

pub use authenticate::{authenticate, CurrentUser};
