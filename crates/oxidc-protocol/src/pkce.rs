//! PKCE verification (RFC 7636).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use subtle::ConstantTimeEq;

use oxidc_crypto::hash::sha256;

use crate::error::{OidcError, OidcResult};
use crate::types::CodeChallengeMethod;

/// Verifier length bounds from RFC 7636 §4.1.
const MIN_VERIFIER_LEN: usize = 43;
const MAX_VERIFIER_LEN: usize = 128;

/// Verifies PKCE code verifiers against stored challenges.
pub struct PkceVerifier;

impl PkceVerifier {
    /// Checks `code_verifier` against the stored challenge.
    ///
    /// Every failure maps to `invalid_grant` with the same generic
    /// message; the distinction is logged, not returned.
    pub fn verify(
        verifier: &str,
        challenge: &str,
        method: CodeChallengeMethod,
    ) -> OidcResult<()> {
        if verifier.len() < MIN_VERIFIER_LEN || verifier.len() > MAX_VERIFIER_LEN {
            tracing::warn!(len = verifier.len(), "PKCE verifier length out of bounds");
            return Err(Self::mismatch());
        }
        if !verifier.bytes().all(Self::is_unreserved) {
            tracing::warn!("PKCE verifier contains characters outside the unreserved set");
            return Err(Self::mismatch());
        }

        let matches: bool = match method {
            CodeChallengeMethod::S256 => Self::compute_challenge(verifier)
                .as_bytes()
                .ct_eq(challenge.as_bytes())
                .into(),
            CodeChallengeMethod::Plain => verifier.as_bytes().ct_eq(challenge.as_bytes()).into(),
        };
        if matches {
            Ok(())
        } else {
            tracing::warn!(%method, "PKCE challenge mismatch");
            Err(Self::mismatch())
        }
    }

    /// `base64url(SHA-256(verifier))` without padding, the S256
    /// challenge transform.
    #[must_use]
    pub fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(sha256(verifier.as_bytes()))
    }

    const fn is_unreserved(byte: u8) -> bool {
        byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
    }

    fn mismatch() -> OidcError {
        OidcError::InvalidGrant("invalid authorization code".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7636 Appendix B test vector.
    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn rfc_7636_vector_verifies() {
        assert_eq!(PkceVerifier::compute_challenge(VERIFIER), CHALLENGE);
        assert!(PkceVerifier::verify(VERIFIER, CHALLENGE, CodeChallengeMethod::S256).is_ok());
    }

    #[test]
    fn wrong_verifier_fails() {
        let wrong = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let err = PkceVerifier::verify(wrong, CHALLENGE, CodeChallengeMethod::S256).unwrap_err();
        assert_eq!(err.error_code(), "invalid_grant");
    }

    #[test]
    fn plain_method_compares_directly() {
        let verifier = "plain-verifier-that-is-long-enough-to-pass-43";
        assert!(PkceVerifier::verify(verifier, verifier, CodeChallengeMethod::Plain).is_ok());
        assert!(
            PkceVerifier::verify(verifier, "something-else", CodeChallengeMethod::Plain).is_err()
        );
    }

    #[test]
    fn length_bounds_enforced() {
        let short = "too-short";
        assert!(PkceVerifier::verify(short, CHALLENGE, CodeChallengeMethod::S256).is_err());
        let long = "a".repeat(129);
        assert!(PkceVerifier::verify(&long, CHALLENGE, CodeChallengeMethod::S256).is_err());
    }

    #[test]
    fn charset_enforced() {
        let bad = format!("{}{}", "a".repeat(42), "!");
        assert!(PkceVerifier::verify(&bad, CHALLENGE, CodeChallengeMethod::S256).is_err());
    }
}
