// ============================
// crates/backend-lib/src/auth/policy.rs
// ============================
//! Path exemption policy.
//!
//! Paths are normalised to end in `/`. A rule ending in `*` exempts every
//! path sharing its prefix; any other rule exempts exactly one path.

/// Marker ending a prefix rule
pub const WILDCARD: char = '*';

/// Routes reachable without credentials
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "/",
    "/api/v1/status/",
    "/api/v1/unauthorized/",
    "/api/v1/forbidden/",
    "/api/v1/users/",
    "/api/v1/auth_session/login/",
    "/api/v1/auth_session/logout/",
];

/// One configured exemption
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionRule {
    Exact(String),
    Prefix(String),
}

impl ExclusionRule {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix(WILDCARD) {
            Some(prefix) => ExclusionRule::Prefix(prefix.to_string()),
            None => ExclusionRule::Exact(pattern.to_string()),
        }
    }

    /// `path` must already be normalised
    pub fn matches(&self, path: &str) -> bool {
        match self {
            ExclusionRule::Exact(exact) => exact == path,
            ExclusionRule::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Ordered set of exemptions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthPolicy {
    rules: Vec<ExclusionRule>,
}

impl AuthPolicy {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: patterns
                .into_iter()
                .map(|pattern| ExclusionRule::parse(pattern.as_ref()))
                .collect(),
        }
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// Whether a request for `path` must be authenticated
    ///
    /// Absent paths and empty policies always require authentication.
    pub fn requires_auth(&self, path: Option<&str>) -> bool {
        let Some(path) = path else {
            return true;
        };
        if self.rules.is_empty() {
            return true;
        }

        let normalized = normalize(path);
        !self.rules.iter().any(|rule| rule.matches(&normalized))
    }
}

/// One-shot form of [`AuthPolicy::requires_auth`]; absent entries are skipped
pub fn requires_auth<S: AsRef<str>>(path: Option<&str>, exclusions: Option<&[Option<S>]>) -> bool {
    let Some(exclusions) = exclusions else {
        return true;
    };
    AuthPolicy::new(exclusions.iter().flatten()).requires_auth(path)
}

fn normalize(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}
