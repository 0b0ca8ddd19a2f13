//! Signing-key management: generation, rotation with a verification
//! grace period, and JWKS publication.
//!
//! At most one key is active for signing at any moment. Rotation
//! generates the successor before touching shared state, so a failed
//! generation leaves the previous key active. Demoted keys stay
//! verify-only until their grace period passes, keeping in-flight
//! tokens valid.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;

use oxidc_crypto::{RsaKeyMaterial, SignatureAlgorithm};

use crate::error::{OidcError, OidcResult};
use crate::jwks::{JsonWebKey, JsonWebKeySet};

/// Maps a signature algorithm onto the JWT library's enum.
#[must_use]
pub const fn jwt_algorithm(alg: SignatureAlgorithm) -> Algorithm {
    match alg {
        SignatureAlgorithm::Rs256 => Algorithm::RS256,
        SignatureAlgorithm::Rs384 => Algorithm::RS384,
        SignatureAlgorithm::Rs512 => Algorithm::RS512,
    }
}

struct ManagedKey {
    kid: String,
    algorithm: SignatureAlgorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    modulus: Vec<u8>,
    exponent: Vec<u8>,
    created_at: DateTime<Utc>,
    /// None while the key is active or not yet demoted.
    expires_at: Option<DateTime<Utc>>,
}

impl ManagedKey {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

struct KeyringState {
    keys: HashMap<String, ManagedKey>,
    active_kid: String,
}

/// Owns all signing-key material. No other component may read a
/// private key; signing happens here.
pub struct SigningKeyManager {
    algorithm: SignatureAlgorithm,
    inner: RwLock<KeyringState>,
}

impl SigningKeyManager {
    /// Creates a manager with one freshly generated active key.
    pub fn new(algorithm: SignatureAlgorithm) -> OidcResult<Self> {
        let key = Self::generate_managed(algorithm)?;
        let active_kid = key.kid.clone();
        let mut keys = HashMap::new();
        keys.insert(active_kid.clone(), key);
        Ok(Self {
            algorithm,
            inner: RwLock::new(KeyringState { keys, active_kid }),
        })
    }

    /// The algorithm this manager signs with.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// The `kid` of the current signing key.
    #[must_use]
    pub fn active_kid(&self) -> String {
        self.read().active_kid.clone()
    }

    /// Rotates the signing key.
    ///
    /// The new key is generated before any shared state changes; on
    /// generation failure the previous key simply stays active. The
    /// demoted key remains usable for verification until `grace` has
    /// passed.
    pub fn rotate(&self, grace: Duration) -> OidcResult<String> {
        let fresh = Self::generate_managed(self.algorithm)?;
        let kid = fresh.kid.clone();

        let mut state = self.write();
        let now = Utc::now();
        let previous = state.active_kid.clone();
        if let Some(old) = state.keys.get_mut(&previous) {
            old.expires_at = Some(now + grace);
        }
        state.keys.insert(kid.clone(), fresh);
        state.active_kid = kid.clone();
        tracing::info!(new_kid = %kid, demoted_kid = %previous, "signing key rotated");
        Ok(kid)
    }

    /// Signs a claims payload with the active key. The JWS header
    /// carries `kid`, `alg`, and `typ: JWT`.
    pub fn sign<T: Serialize>(&self, claims: &T) -> OidcResult<String> {
        let state = self.read();
        let key = state.keys.get(&state.active_kid).ok_or_else(|| {
            OidcError::ServerError("no active signing key".to_string())
        })?;
        let mut header = Header::new(jwt_algorithm(key.algorithm));
        header.kid = Some(key.kid.clone());
        jsonwebtoken::encode(&header, claims, &key.encoding).map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            OidcError::ServerError("token signing failed".to_string())
        })
    }

    /// Looks up the verification key for a `kid` among all non-expired
    /// keys, active or demoted.
    #[must_use]
    pub fn decoding_key(&self, kid: &str) -> Option<(SignatureAlgorithm, DecodingKey)> {
        let state = self.read();
        let now = Utc::now();
        state
            .keys
            .get(kid)
            .filter(|k| !k.is_expired(now))
            .map(|k| (k.algorithm, k.decoding.clone()))
    }

    /// The published key set: every non-expired public key.
    #[must_use]
    pub fn public_jwks(&self) -> JsonWebKeySet {
        let state = self.read();
        let now = Utc::now();
        let mut keys: Vec<_> = state
            .keys
            .values()
            .filter(|k| !k.is_expired(now))
            .collect();
        // Active key first, then newest demoted keys.
        keys.sort_by(|a, b| {
            let a_active = a.kid == state.active_kid;
            let b_active = b.kid == state.active_kid;
            b_active
                .cmp(&a_active)
                .then(b.created_at.cmp(&a.created_at))
        });
        JsonWebKeySet::new(
            keys.into_iter()
                .map(|k| {
                    JsonWebKey::rsa_public(
                        k.kid.clone(),
                        k.algorithm.to_string(),
                        &k.modulus,
                        &k.exponent,
                    )
                })
                .collect(),
        )
    }

    /// Drops keys whose grace period has fully passed. Returns how
    /// many were removed. The active key is never removed.
    pub fn sweep_expired(&self) -> usize {
        let mut state = self.write();
        let now = Utc::now();
        let active = state.active_kid.clone();
        let before = state.keys.len();
        state
            .keys
            .retain(|kid, key| *kid == active || !key.is_expired(now));
        before - state.keys.len()
    }

    fn generate_managed(algorithm: SignatureAlgorithm) -> OidcResult<ManagedKey> {
        let material = RsaKeyMaterial::generate(algorithm).map_err(|e| {
            tracing::error!(error = %e, "signing key generation failed");
            OidcError::ServerError("key generation failed".to_string())
        })?;
        let encoding = EncodingKey::from_rsa_pem(material.private_pem.as_bytes())
            .map_err(|e| OidcError::ServerError(format!("invalid generated key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(material.public_pem.as_bytes())
            .map_err(|e| OidcError::ServerError(format!("invalid generated key: {e}")))?;
        Ok(ManagedKey {
            kid: material.kid,
            algorithm,
            encoding,
            decoding,
            modulus: material.modulus,
            exponent: material.exponent,
            created_at: Utc::now(),
            expires_at: None,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, KeyringState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, KeyringState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_manager_has_one_published_key() {
        let manager = SigningKeyManager::new(SignatureAlgorithm::Rs256).unwrap();
        let jwks = manager.public_jwks();
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0].kid, manager.active_kid());
        assert_eq!(jwks.keys[0].alg, "RS256");
    }

    #[test]
    fn rotation_keeps_old_key_verifiable_during_grace() {
        let manager = SigningKeyManager::new(SignatureAlgorithm::Rs256).unwrap();
        let old_kid = manager.active_kid();

        let new_kid = manager.rotate(Duration::days(7)).unwrap();
        assert_ne!(old_kid, new_kid);
        assert_eq!(manager.active_kid(), new_kid);

        // Both keys are published and both resolve for verification.
        let jwks = manager.public_jwks();
        assert_eq!(jwks.keys.len(), 2);
        assert_eq!(jwks.keys[0].kid, new_kid);
        assert!(manager.decoding_key(&old_kid).is_some());
        assert!(manager.decoding_key(&new_kid).is_some());
    }

    #[test]
    fn expired_grace_hides_and_sweeps_the_old_key() {
        let manager = SigningKeyManager::new(SignatureAlgorithm::Rs256).unwrap();
        let old_kid = manager.active_kid();

        manager.rotate(Duration::seconds(-1)).unwrap();
        assert!(manager.decoding_key(&old_kid).is_none());
        assert_eq!(manager.public_jwks().keys.len(), 1);
        assert_eq!(manager.sweep_expired(), 1);
        assert_eq!(manager.sweep_expired(), 0);
    }

    #[test]
    fn sign_header_carries_kid_and_alg() {
        let manager = SigningKeyManager::new(SignatureAlgorithm::Rs256).unwrap();
        let token = manager
            .sign(&serde_json::json!({"sub": "u1", "exp": 4102444800i64}))
            .unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(manager.active_kid().as_str()));
        assert_eq!(header.alg, Algorithm::RS256);
    }
}
