// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
//! Session id generation.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
/** Secure token generation for session ids
Tokens come from the thread-local CSPRNG, which is seeded from OS entropy. */
use rand::RngCore;

/// Session id size in bytes (16 bytes = 128 bits of entropy)
pub const SESSION_ID_BYTES: usize = 16;

/** Generate a session id
# Returns
128 random bits as a base64 URL-safe string without padding (22 chars) */
pub fn generate_session_id() -> String {
    generate_secure_token_with_size(SESSION_ID_BYTES)
}

/** Generate a cryptographically secure random token with specified size
# Arguments
* `bytes` - The size of the random token in bytes
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_secure_token_with_size(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
