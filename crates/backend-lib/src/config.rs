// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::password::{DEFAULT_ARGON2_ITERATIONS, DEFAULT_ARGON2_MEMORY_KIB, DEFAULT_SCRYPT_LOG_N};
use crate::auth::rate_limit::{DEFAULT_LOCKOUT_DURATION, DEFAULT_MAX_ATTEMPTS};
use crate::auth::{
    AuthOptions, CredentialHasher, HashAlgorithm, LoginThrottle, StrategyKind, DEFAULT_EXCLUDED_PATHS,
    DEFAULT_HASH_TIMEOUT, DEFAULT_SESSION_COOKIE,
};

#[cfg(test)]
mod config_tests;

/// Prefix of environment overrides, e.g. `ACCOUNT_AUTH_SERVER__PORT`
pub const ENV_PREFIX: &str = "ACCOUNT_AUTH_";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    /// Default `tracing` filter, overridden by `RUST_LOG`
    pub log_level: String,
    pub log_format: LogFormat,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub password_hash: PasswordHashSettings,
    pub login_throttle: LoginThrottleSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub backend: DatabaseBackend,
    /// SQLite database file
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    /// Bound on a single store call
    pub operation_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub strategy: StrategyKind,
    pub session_cookie_name: String,
    /// Paths served without credentials; a trailing `*` matches a prefix
    pub excluded_paths: Vec<String>,
    /// Session lifetime; unset keeps sessions until logout
    pub session_ttl_secs: Option<u64>,
    pub hash_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashSettings {
    pub algorithm: HashAlgorithm,
    pub scrypt_log_n: u8,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginThrottleSettings {
    pub max_attempts: u32,
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            database: DatabaseSettings::default(),
            auth: AuthSettings::default(),
            password_hash: PasswordHashSettings::default(),
            login_throttle: LoginThrottleSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            path: PathBuf::from("data/users.db"),
            busy_timeout_ms: 5_000,
            operation_timeout_ms: 5_000,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
            session_ttl_secs: None,
            hash_timeout_ms: DEFAULT_HASH_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Default for PasswordHashSettings {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            scrypt_log_n: DEFAULT_SCRYPT_LOG_N,
            argon2_memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            argon2_iterations: DEFAULT_ARGON2_ITERATIONS,
        }
    }
}

impl Default for LoginThrottleSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_secs: DEFAULT_LOCKOUT_DURATION.as_secs(),
        }
    }
}

impl Settings {
    /// Layered sources: defaults, the optional TOML file, prefixed
    /// environment variables, then the legacy `SESSION_NAME` and `AUTH_TYPE`
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&["SESSION_NAME"]).map(|_| "auth.session_cookie_name".into()))
            .merge(Env::raw().only(&["AUTH_TYPE"]).map(|_| "auth.strategy".into()))
    }

    /// Load and validate settings
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_file {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
        }
        let settings: Settings = Self::figment(config_file)
            .extract()
            .context("failed to load settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("unknown log level {:?}", self.log_level);
        }
        if !is_cookie_token(&self.auth.session_cookie_name) {
            bail!("invalid session cookie name {:?}", self.auth.session_cookie_name);
        }
        if self.auth.session_ttl_secs == Some(0) {
            bail!("auth.session_ttl_secs must be positive when set");
        }
        if self.auth.hash_timeout_ms == 0 {
            bail!("auth.hash_timeout_ms must be positive");
        }
        if self.database.operation_timeout_ms == 0 {
            bail!("database.operation_timeout_ms must be positive");
        }
        if self.login_throttle.max_attempts == 0 {
            bail!("login_throttle.max_attempts must be positive");
        }
        self.build_hasher()?;
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.server.host, self.server.port))
    }

    pub fn build_hasher(&self) -> Result<CredentialHasher> {
        let hashing = &self.password_hash;
        let hasher = match hashing.algorithm {
            HashAlgorithm::Scrypt => CredentialHasher::scrypt(hashing.scrypt_log_n),
            HashAlgorithm::Argon2 => CredentialHasher::argon2(hashing.argon2_memory_kib, hashing.argon2_iterations),
        };
        Ok(hasher?)
    }

    pub fn auth_options(&self) -> AuthOptions {
        AuthOptions {
            strategy: self.auth.strategy,
            excluded_paths: self.auth.excluded_paths.clone(),
            session_ttl: self.auth.session_ttl_secs.map(Duration::from_secs),
            hash_timeout: Duration::from_millis(self.auth.hash_timeout_ms),
        }
    }

    pub fn login_throttle(&self) -> LoginThrottle {
        LoginThrottle::new(
            self.login_throttle.max_attempts,
            Duration::from_secs(self.login_throttle.lockout_secs),
        )
    }
}

/// RFC 6265 cookie-name token
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
}
