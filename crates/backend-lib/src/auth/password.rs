// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use std::fmt;
use std::time::Duration;

use argon2::Argon2;
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Scrypt,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::AuthError;

/// Output length of scrypt hashes in bytes
const SCRYPT_OUTPUT_LEN: usize = 32;

/// Default scrypt cost (N = 2^15)
pub const DEFAULT_SCRYPT_LOG_N: u8 = 15;

/// Default Argon2 memory cost in KiB
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19 * 1024;

/// Default Argon2 iteration count
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 2;

/// Salted password hash in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for HashedPassword {
    fn from(phc: String) -> Self {
        Self(phc)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

/// Algorithm used for new hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Scrypt,
    Argon2,
}

#[derive(Clone)]
enum Engine {
    Scrypt(scrypt::Params),
    Argon2(argon2::Params),
}

/// Salted, adaptive-cost password hasher
///
/// New hashes use the configured algorithm; verification follows the
/// algorithm recorded in the stored hash.
#[derive(Clone)]
pub struct CredentialHasher {
    engine: Engine,
}

impl CredentialHasher {
    pub fn scrypt(log_n: u8) -> Result<Self, AuthError> {
        let params = scrypt::Params::new(log_n, 8, 1, SCRYPT_OUTPUT_LEN)
            .map_err(|e| AuthError::Hashing(format!("invalid scrypt parameters: {e}")))?;
        Ok(Self {
            engine: Engine::Scrypt(params),
        })
    }

    pub fn argon2(memory_kib: u32, iterations: u32) -> Result<Self, AuthError> {
        let params = argon2::Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AuthError::Hashing(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self {
            engine: Engine::Argon2(params),
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self.engine {
            Engine::Scrypt(_) => HashAlgorithm::Scrypt,
            Engine::Argon2(_) => HashAlgorithm::Argon2,
        }
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<HashedPassword, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = match &self.engine {
            Engine::Scrypt(params) => Scrypt
                .hash_password_customized(plain.as_bytes(), None, None, *params, &salt)
                .map(|hash| hash.to_string()),
            Engine::Argon2(params) => {
                Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params.clone())
                    .hash_password(plain.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
            },
        }
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(HashedPassword(phc))
    }

    /// Verify a password against a stored hash
    ///
    /// Returns `false` for malformed hashes and unknown algorithms.
    pub fn verify(&self, hash: &HashedPassword, plain: &str) -> bool {
        verify_password(hash.as_str(), plain)
    }

    /// [`Self::hash`] on the blocking pool, bounded by `timeout`
    pub async fn hash_blocking(&self, plain: &str, timeout: Duration) -> Result<HashedPassword, AuthError> {
        let hasher = self.clone();
        let plain = Zeroizing::new(plain.to_string());
        run_blocking("password hashing", timeout, move || hasher.hash(&plain)).await?
    }

    /// [`Self::verify`] on the blocking pool, bounded by `timeout`
    pub async fn verify_blocking(
        &self,
        hash: &HashedPassword,
        plain: &str,
        timeout: Duration,
    ) -> Result<bool, AuthError> {
        let hash = hash.clone();
        let plain = Zeroizing::new(plain.to_string());
        run_blocking("password verification", timeout, move || verify_password(hash.as_str(), &plain)).await
    }
}

/// Verify a password against a PHC hash string
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    match parsed_hash.algorithm.as_str() {
        "scrypt" => Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok(),
        "argon2id" | "argon2i" | "argon2d" => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed_hash)
            .is_ok(),
        _ => false,
    }
}

async fn run_blocking<T, F>(operation: &'static str, timeout: Duration, work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_err)) => Err(AuthError::Task(join_err.to_string())),
        Err(_) => Err(AuthError::Timeout { operation }),
    }
}
