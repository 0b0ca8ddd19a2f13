//! Nonce storage for replay protection.
//!
//! A nonce is one-time per client. Registration fails while an
//! unconsumed entry for the same client exists, so a second authorize
//! call replaying a nonce is rejected; consumption at ID-token issuance
//! is atomic, so at most one token exchange can ever embed it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use oxidc_crypto::hash::sha256_base64url;

use crate::error::OidcResult;

/// Hashes a nonce for storage and lookup.
#[must_use]
pub fn hash_nonce(nonce: &str) -> String {
    sha256_base64url(nonce.as_bytes())
}

#[derive(Debug, Clone)]
struct StoredNonce {
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl StoredNonce {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Persistence for one-time nonces.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Registers a nonce for a client.
    ///
    /// Returns `false` when an unconsumed, unexpired entry for the
    /// same client and nonce already exists (replay at authorize time).
    async fn put(&self, nonce: &str, client_id: &str, ttl: Duration) -> OidcResult<bool>;

    /// Atomically marks a nonce consumed.
    ///
    /// Returns `false` for unknown, expired, or already-consumed
    /// nonces; callers must treat `false` as a hard failure.
    async fn consume(&self, nonce: &str, client_id: &str) -> OidcResult<bool>;

    /// Removes expired entries; returns how many were dropped.
    async fn sweep_expired(&self) -> OidcResult<usize>;
}

/// In-memory nonce store keyed by `(client_id, nonce_hash)`.
#[derive(Default)]
pub struct InMemoryNonceStore {
    nonces: RwLock<HashMap<(String, String), StoredNonce>>,
}

impl InMemoryNonceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn put(&self, nonce: &str, client_id: &str, ttl: Duration) -> OidcResult<bool> {
        let mut nonces = self.nonces.write().await;
        let now = Utc::now();
        let key = (client_id.to_string(), hash_nonce(nonce));
        if let Some(existing) = nonces.get(&key) {
            if existing.used_at.is_none() && !existing.is_expired(now) {
                return Ok(false);
            }
        }
        nonces.insert(
            key,
            StoredNonce {
                expires_at: now + ttl,
                used_at: None,
            },
        );
        Ok(true)
    }

    async fn consume(&self, nonce: &str, client_id: &str) -> OidcResult<bool> {
        let mut nonces = self.nonces.write().await;
        let now = Utc::now();
        let key = (client_id.to_string(), hash_nonce(nonce));
        match nonces.get_mut(&key) {
            Some(entry) if entry.used_at.is_none() && !entry.is_expired(now) => {
                entry.used_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn sweep_expired(&self) -> OidcResult<usize> {
        let mut nonces = self.nonces.write().await;
        let now = Utc::now();
        let before = nonces.len();
        nonces.retain(|_, n| !n.is_expired(now) && n.used_at.is_none());
        Ok(before - nonces.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let store = InMemoryNonceStore::new();
        assert!(store.put("n-1", "app1", Duration::minutes(5)).await.unwrap());
        assert!(!store.put("n-1", "app1", Duration::minutes(5)).await.unwrap());
        // A different client may use the same nonce value.
        assert!(store.put("n-1", "app2", Duration::minutes(5)).await.unwrap());
    }

    #[tokio::test]
    async fn consume_is_one_time() {
        let store = InMemoryNonceStore::new();
        store.put("n-2", "app1", Duration::minutes(5)).await.unwrap();
        assert!(store.consume("n-2", "app1").await.unwrap());
        assert!(!store.consume("n-2", "app1").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_or_expired_never_consumes() {
        let store = InMemoryNonceStore::new();
        assert!(!store.consume("ghost", "app1").await.unwrap());
        store.put("n-3", "app1", Duration::seconds(-1)).await.unwrap();
        assert!(!store.consume("n-3", "app1").await.unwrap());
    }

    #[tokio::test]
    async fn consumed_nonce_can_be_registered_again() {
        let store = InMemoryNonceStore::new();
        store.put("n-4", "app1", Duration::minutes(5)).await.unwrap();
        store.consume("n-4", "app1").await.unwrap();
        // Once consumed the value is free again for a fresh flow.
        assert!(store.put("n-4", "app1", Duration::minutes(5)).await.unwrap());
    }

    #[tokio::test]
    async fn sweep_reaps_expired_and_used() {
        let store = InMemoryNonceStore::new();
        store.put("gone", "app1", Duration::seconds(-1)).await.unwrap();
        store.put("used", "app1", Duration::minutes(5)).await.unwrap();
        store.consume("used", "app1").await.unwrap();
        store.put("live", "app1", Duration::minutes(5)).await.unwrap();
        assert_eq!(store.sweep_expired().await.unwrap(), 2);
    }
}
