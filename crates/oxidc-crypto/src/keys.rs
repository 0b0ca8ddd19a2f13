//! RSA key pair generation and key ID derivation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use thiserror::Error;

use crate::algorithm::SignatureAlgorithm;
use crate::hash::sha256;

/// RSA modulus size for generated signing keys.
pub const RSA_KEY_BITS: usize = 2048;

/// Errors from key generation or encoding.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The RSA key pair could not be generated.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The key pair could not be encoded to PEM.
    #[error("key encoding failed: {0}")]
    KeyEncoding(String),
}

/// A freshly generated RSA key pair with everything the signing-key
/// registry needs: PEM encodings, public components for JWK export,
/// and a derived key ID.
pub struct RsaKeyMaterial {
    /// Key ID derived from the public key.
    pub kid: String,
    /// Signature algorithm this key will sign with.
    pub algorithm: SignatureAlgorithm,
    /// PKCS#8 PEM encoding of the private key.
    pub private_pem: String,
    /// SPKI PEM encoding of the public key.
    pub public_pem: String,
    /// RSA modulus, big-endian bytes.
    pub modulus: Vec<u8>,
    /// RSA public exponent, big-endian bytes.
    pub exponent: Vec<u8>,
}

impl RsaKeyMaterial {
    /// Generates a new RSA-2048 key pair for the given algorithm.
    pub fn generate(algorithm: SignatureAlgorithm) -> Result<Self, CryptoError> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = private.to_public_key();

        let private_pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?
            .to_string();
        let public_pem = public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;

        Ok(Self {
            kid: generate_key_id(public_pem.as_bytes()),
            algorithm,
            modulus: public.n().to_bytes_be(),
            exponent: public.e().to_bytes_be(),
            private_pem,
            public_pem,
        })
    }
}

impl std::fmt::Debug for RsaKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKeyMaterial")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("private_pem", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Derives a key ID from public key material: the first 8 bytes of its
/// SHA-256 digest, base64url-encoded.
#[must_use]
pub fn generate_key_id(public_key: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(&sha256(public_key)[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_id_is_stable_and_short() {
        let kid1 = generate_key_id(b"public-key-bytes");
        let kid2 = generate_key_id(b"public-key-bytes");
        assert_eq!(kid1, kid2);
        // 8 bytes -> 11 base64url chars without padding
        assert_eq!(kid1.len(), 11);
        assert_ne!(kid1, generate_key_id(b"other-key-bytes"));
    }

    #[test]
    fn generated_material_is_complete() {
        let key = RsaKeyMaterial::generate(SignatureAlgorithm::Rs256).unwrap();
        assert!(key.private_pem.contains("BEGIN PRIVATE KEY"));
        assert!(key.public_pem.contains("BEGIN PUBLIC KEY"));
        assert_eq!(key.modulus.len(), RSA_KEY_BITS / 8);
        assert_eq!(key.exponent, vec![0x01, 0x00, 0x01]);
        assert_eq!(key.kid, generate_key_id(key.public_pem.as_bytes()));
    }

    #[test]
    fn debug_redacts_private_key() {
        let key = RsaKeyMaterial::generate(SignatureAlgorithm::Rs256).unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("BEGIN PRIVATE KEY"));
    }
}
