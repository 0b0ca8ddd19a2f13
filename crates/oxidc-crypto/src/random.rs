//! CSPRNG-backed generation of codes, tokens, and identifiers.
//!
//! Everything here draws from the OS entropy pool via `rand::thread_rng`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::distributions::{Alphanumeric, DistString};
use rand::RngCore;

/// Generates `len` random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generates a random alphanumeric string of the given length.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), len)
}

/// Generates `len` random bytes, base64url-encoded without padding.
#[must_use]
pub fn random_base64url(len: usize) -> String {
    URL_SAFE_NO_PAD.encode(random_bytes(len))
}

/// Generates an authorization code.
///
/// 32 alphanumeric characters, roughly 190 bits of entropy, safe to
/// carry in a redirect query parameter.
#[must_use]
pub fn generate_authorization_code() -> String {
    random_alphanumeric(32)
}

/// Generates an opaque refresh token (48 random bytes, base64url).
#[must_use]
pub fn generate_refresh_token() -> String {
    random_base64url(48)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_codes_are_unique_and_urlsafe() {
        let a = generate_authorization_code();
        let b = generate_authorization_code();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn refresh_tokens_have_expected_length() {
        let token = generate_refresh_token();
        // 48 bytes -> 64 base64url chars
        assert_eq!(token.len(), 64);
        assert!(!token.contains('='));
    }

    #[test]
    fn random_bytes_differ() {
        assert_ne!(random_bytes(16), random_bytes(16));
    }
}
