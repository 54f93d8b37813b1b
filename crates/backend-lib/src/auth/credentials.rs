// ============================
// crates/backend-lib/src/auth/credentials.rs
// ============================
//! Basic-scheme Authorization header parsing.
//!
//! Every stage returns `None` on bad input so callers can chain them
//! without error handling.
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

/// Scheme prefix recognised by [`extract_scheme`], matched case-sensitively
pub const BASIC_PREFIX: &str = "Basic ";

/// Token following the `Basic ` prefix
pub fn extract_scheme(header_value: Option<&str>) -> Option<&str> {
    header_value?.strip_prefix(BASIC_PREFIX)
}

/// Base64-decode `token` into a UTF-8 string
pub fn decode(token: Option<&str>) -> Option<String> {
    let bytes = STANDARD.decode(token?).ok()?;
    String::from_utf8(bytes).ok()
}

/// Split `identifier:secret` on the first colon
pub fn split_credentials(decoded: Option<&str>) -> (Option<&str>, Option<&str>) {
    match decoded.and_then(|value| value.split_once(':')) {
        Some((identifier, secret)) => (Some(identifier), Some(secret)),
        None => (None, None),
    }
}

/// Identifier and secret taken from one Authorization header
pub struct Credentials {
    pub email: String,
    pub password: Zeroizing<String>,
}

impl Credentials {
    /// Run the full extraction chain on an Authorization header value.
    ///
    /// An empty email or password counts as missing.
    pub fn from_authorization(header_value: Option<&str>) -> Option<Self> {
        let decoded = Zeroizing::new(decode(extract_scheme(header_value))?);
        match split_credentials(Some(decoded.as_str())) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => Some(Self {
                email: email.to_string(),
                password: Zeroizing::new(password.to_string()),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn test_extract_scheme() {
        assert_eq!(extract_scheme(None), None);
        assert_eq!(extract_scheme(Some("Holberton")), None);
        assert_eq!(extract_scheme(Some("Basic")), None);
        assert_eq!(extract_scheme(Some("basic dGVzdA==")), None);
        assert_eq!(extract_scheme(Some("Bearer abc")), None);
        assert_eq!(extract_scheme(Some("Basic dGVzdA==")), Some("dGVzdA=="));
        assert_eq!(extract_scheme(Some("Basic ")), Some(""));
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(None), None);
        assert_eq!(decode(Some("not base64!")), None);
        assert_eq!(decode(Some("dGVzdA==")).as_deref(), Some("test"));
        // 0xFF 0xFE is valid base64 but not UTF-8
        assert_eq!(decode(Some("//4=")), None);
    }

    #[test]
    fn test_split_credentials() {
        assert_eq!(split_credentials(None), (None, None));
        assert_eq!(split_credentials(Some("no colon")), (None, None));
        assert_eq!(split_credentials(Some("a:b")), (Some("a"), Some("b")));
        assert_eq!(split_credentials(Some("user:pa:ss")), (Some("user"), Some("pa:ss")));
        assert_eq!(split_credentials(Some(":")), (Some(""), Some("")));
    }

    #[test]
    fn test_chain_round_trip() {
        let header = basic("a:b");
        let decoded = decode(extract_scheme(Some(&header)));
        assert_eq!(split_credentials(decoded.as_deref()), (Some("a"), Some("b")));
    }

    #[test]
    fn test_from_authorization() {
        let creds = Credentials::from_authorization(Some(&basic("bob@hbtn.io:H0lb:erton"))).unwrap();
        assert_eq!(creds.email, "bob@hbtn.io");
        assert_eq!(creds.password.as_str(), "H0lb:erton");

        assert!(Credentials::from_authorization(Some(&basic(":secret"))).is_none());
        assert!(Credentials::from_authorization(Some(&basic("bob@hbtn.io:"))).is_none());
        assert!(Credentials::from_authorization(Some("Basic %%%")).is_none());
        assert!(Credentials::from_authorization(None).is_none());
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::from_authorization(Some(&basic("bob@hbtn.io:secret"))).unwrap();
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
