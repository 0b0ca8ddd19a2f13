//! SHA-2 digests and base64url digest helpers.
//!
//! Opaque artifacts (authorization codes, refresh tokens, nonces) are
//! stored hashed, never in plaintext; the canonical stored form is
//! `base64url(SHA-256(value))` without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Computes the SHA-256 digest of the input.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

/// Computes the SHA-384 digest of the input.
#[must_use]
pub fn sha384(data: &[u8]) -> Vec<u8> {
    Sha384::digest(data).to_vec()
}

/// Computes the SHA-512 digest of the input.
#[must_use]
pub fn sha512(data: &[u8]) -> Vec<u8> {
    Sha512::digest(data).to_vec()
}

/// Base64url-encoded (no padding) SHA-256 digest.
///
/// The storage form for every single-use secret the server persists.
#[must_use]
pub fn sha256_base64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc")
        let digest = sha256(b"abc");
        assert_eq!(
            hex_of(&digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(sha256(b"x").len(), 32);
        assert_eq!(sha384(b"x").len(), 48);
        assert_eq!(sha512(b"x").len(), 64);
    }

    #[test]
    fn base64url_digest_has_no_padding() {
        let encoded = sha256_base64url(b"some-authorization-code");
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(encoded.len(), 43);
    }

    fn hex_of(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
