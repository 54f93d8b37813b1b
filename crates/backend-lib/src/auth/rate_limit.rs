// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Throttling of repeated wrong-password logins.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Default number of consecutive failures before lockout
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (5 minutes)
pub const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(5 * 60);

/// Failures older than this are forgotten by `cleanup`
const FAILURE_MEMORY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct ThrottleEntry {
    failed_attempts: u32,
    last_failure: Instant,
    lockout_expiry: Option<Instant>,
}

/// Per-account login throttle, keyed by lower-cased email
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    attempts: Arc<DashMap<String, ThrottleEntry>>,
    max_attempts: u32,
    lockout_duration: Duration,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_DURATION)
    }
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
        }
    }

    /// Record a wrong password for `email`
    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();
        let mut entry = self.attempts.entry(key(email)).or_insert_with(|| ThrottleEntry {
            failed_attempts: 0,
            last_failure: now,
            lockout_expiry: None,
        });

        // A lapsed lockout starts a fresh count
        if entry.lockout_expiry.is_some_and(|expiry| now >= expiry) {
            entry.failed_attempts = 0;
            entry.lockout_expiry = None;
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts && entry.lockout_expiry.is_none() {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            warn!(
                attempts = entry.failed_attempts,
                lockout_secs = self.lockout_duration.as_secs(),
                "account locked after repeated login failures"
            );
        }
    }

    /// Forget failures for `email` after a successful login
    pub fn record_success(&self, email: &str) {
        self.attempts.remove(&key(email));
    }

    /// Whether `email` may attempt a login now
    pub fn check(&self, email: &str) -> bool {
        match self.attempts.get(&key(email)) {
            Some(entry) => entry.lockout_expiry.map_or(true, |expiry| Instant::now() >= expiry),
            None => true,
        }
    }

    /// Drop lapsed lockouts and stale failure counts
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.attempts.retain(|_, entry| match entry.lockout_expiry {
            Some(expiry) => now < expiry,
            None => now.duration_since(entry.last_failure) < FAILURE_MEMORY,
        });
    }

    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}

fn key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockout_after_max_attempts() {
        let throttle = LoginThrottle::new(3, Duration::from_secs(60));
        for _ in 0..2 {
            throttle.record_failure("a@b.com");
            assert!(throttle.check("a@b.com"));
        }
        throttle.record_failure("a@b.com");
        assert!(!throttle.check("a@b.com"));
        // Keys ignore case
        assert!(!throttle.check("A@B.com"));
        assert!(throttle.check("other@b.com"));
    }

    #[test]
    fn test_success_clears_failures() {
        let throttle = LoginThrottle::new(2, Duration::from_secs(60));
        throttle.record_failure("a@b.com");
        throttle.record_success("a@b.com");
        throttle.record_failure("a@b.com");
        assert!(throttle.check("a@b.com"));
    }

    #[test]
    fn test_lockout_lapses() {
        let throttle = LoginThrottle::new(1, Duration::ZERO);
        throttle.record_failure("a@b.com");
        assert!(throttle.check("a@b.com"));

        throttle.cleanup();
        assert_eq!(throttle.tracked(), 0);
    }

    #[test]
    fn test_cleanup_keeps_active_entries() {
        let throttle = LoginThrottle::new(1, Duration::from_secs(60));
        throttle.record_failure("locked@b.com");
        let lenient = LoginThrottle::new(10, Duration::from_secs(60));
        lenient.record_failure("counting@b.com");

        throttle.cleanup();
        lenient.cleanup();
        assert_eq!(throttle.tracked(), 1);
        assert_eq!(lenient.tracked(), 1);
    }
}
