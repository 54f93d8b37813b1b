// ============================
// crates/backend-lib/src/metrics.rs
// ============================
//! Central place for Prometheus metric keys
pub const USER_REGISTERED: &str = "auth.user_registered";
pub const LOGIN_SUCCEEDED: &str = "auth.login_succeeded";
/// Labelled with `reason`
pub const LOGIN_FAILED: &str = "auth.login_failed";
pub const SESSION_CREATED: &str = "auth.session_created";
pub const SESSION_DESTROYED: &str = "auth.session_destroyed";
/// Labelled with `reason`
pub const REQUEST_REJECTED: &str = "auth.request_rejected";
