//! JSON Web Key Set types for the `/jwks` endpoint (RFC 7517).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A public RSA signing key in JWK format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type; always `RSA` here.
    pub kty: String,
    /// Key use; always `sig`.
    #[serde(rename = "use")]
    pub key_use: String,
    /// Signature algorithm this key verifies.
    pub alg: String,
    /// Key ID referenced by token headers.
    pub kid: String,
    /// RSA modulus, base64url without padding.
    pub n: String,
    /// RSA public exponent, base64url without padding.
    pub e: String,
}

impl JsonWebKey {
    /// Builds an RSA signature-verification JWK from raw big-endian
    /// modulus and exponent bytes.
    #[must_use]
    pub fn rsa_public(
        kid: impl Into<String>,
        alg: impl Into<String>,
        modulus: &[u8],
        exponent: &[u8],
    ) -> Self {
        Self {
            kty: "RSA".to_string(),
            key_use: "sig".to_string(),
            alg: alg.into(),
            kid: kid.into(),
            n: URL_SAFE_NO_PAD.encode(modulus),
            e: URL_SAFE_NO_PAD.encode(exponent),
        }
    }
}

/// A set of public keys, as served from `/jwks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// The published keys.
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Creates a key set.
    #[must_use]
    pub const fn new(keys: Vec<JsonWebKey>) -> Self {
        Self { keys }
    }

    /// Finds a key by its `kid`.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}
