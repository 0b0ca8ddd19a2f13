//! Refresh token storage with rotation and lineage revocation.
//!
//! Tokens are stored hashed. Redemption revokes the presented token
//! and the caller stores a successor carrying `rotated_from`, forming
//! a lineage chain. Presenting an already-revoked token is treated as
//! theft: the entire lineage (ancestors and descendants) is revoked.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use oxidc_crypto::hash::sha256_base64url;

use crate::error::OidcResult;

/// Hashes a refresh token for storage and lookup.
#[must_use]
pub fn hash_token(token: &str) -> String {
    sha256_base64url(token.as_bytes())
}

/// A stored refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    /// Stable record id, referenced by `rotated_from`.
    pub id: Uuid,
    /// Base64url SHA-256 of the token.
    pub token_hash: String,
    /// User the grant belongs to.
    pub user_id: String,
    /// Client the token was issued to.
    pub client_id: String,
    /// Granted scopes, in request order.
    pub scope: Vec<String>,
    /// When the user actively authenticated, carried through rotation.
    pub auth_time: DateTime<Utc>,
    /// Predecessor in the rotation chain.
    pub rotated_from: Option<Uuid>,
    /// Issuance instant.
    pub issued_at: DateTime<Utc>,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Set on rotation or revocation.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Creates a record for a freshly issued token.
    #[must_use]
    pub fn new(
        token: &str,
        user_id: impl Into<String>,
        client_id: impl Into<String>,
        scope: Vec<String>,
        auth_time: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            token_hash: hash_token(token),
            user_id: user_id.into(),
            client_id: client_id.into(),
            scope,
            auth_time,
            rotated_from: None,
            issued_at: now,
            expires_at: now + ttl,
            revoked_at: None,
        }
    }

    /// Creates the successor record in a rotation chain.
    #[must_use]
    pub fn rotated(token: &str, predecessor: &Self, ttl: Duration) -> Self {
        let mut record = Self::new(
            token,
            predecessor.user_id.clone(),
            predecessor.client_id.clone(),
            predecessor.scope.clone(),
            predecessor.auth_time,
            ttl,
        );
        record.rotated_from = Some(predecessor.id);
        record
    }

    /// Whether the token has passed its TTL.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Outcome of redeeming a refresh token.
#[derive(Debug)]
pub enum RefreshConsume {
    /// The token was live and is now revoked; the caller issues and
    /// stores its successor.
    Rotated(RefreshTokenRecord),
    /// The token had already been rotated or revoked. Security event:
    /// the caller must revoke the whole lineage.
    ReuseDetected(RefreshTokenRecord),
    /// Unknown or expired token.
    Unknown,
}

/// Persistence for refresh tokens.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Stores a freshly issued token.
    async fn put(&self, record: RefreshTokenRecord) -> OidcResult<()>;

    /// Atomically redeems a token by hash; see [`RefreshConsume`].
    async fn consume(&self, token_hash: &str) -> OidcResult<RefreshConsume>;

    /// Looks up a token by hash without touching its state.
    async fn find(&self, token_hash: &str) -> OidcResult<Option<RefreshTokenRecord>>;

    /// Revokes every record in the lineage containing `id`, ancestors
    /// and descendants alike. Returns how many were newly revoked.
    async fn revoke_lineage(&self, id: Uuid) -> OidcResult<usize>;

    /// Removes expired entries; returns how many were dropped.
    async fn sweep_expired(&self) -> OidcResult<usize>;
}

/// In-memory refresh token store keyed by token hash.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Collects the full lineage of `id` over the record set: the chain of
/// `rotated_from` ancestors plus all transitive descendants.
fn lineage_ids(records: &HashMap<String, RefreshTokenRecord>, id: Uuid) -> Vec<Uuid> {
    let mut family = vec![id];
    let mut grew = true;
    while grew {
        grew = false;
        for record in records.values() {
            let related_down = record
                .rotated_from
                .is_some_and(|parent| family.contains(&parent));
            if related_down && !family.contains(&record.id) {
                family.push(record.id);
                grew = true;
            }
            if family.contains(&record.id) {
                if let Some(parent) = record.rotated_from {
                    if !family.contains(&parent) {
                        family.push(parent);
                        grew = true;
                    }
                }
            }
        }
    }
    family
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn put(&self, record: RefreshTokenRecord) -> OidcResult<()> {
        self.tokens
            .write()
            .await
            .insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn consume(&self, token_hash: &str) -> OidcResult<RefreshConsume> {
        let mut tokens = self.tokens.write().await;
        let now = Utc::now();
        match tokens.get_mut(token_hash) {
            None => Ok(RefreshConsume::Unknown),
            Some(entry) if entry.is_expired(now) => Ok(RefreshConsume::Unknown),
            Some(entry) if entry.revoked_at.is_some() => {
                Ok(RefreshConsume::ReuseDetected(entry.clone()))
            }
            Some(entry) => {
                let live = entry.clone();
                entry.revoked_at = Some(now);
                Ok(RefreshConsume::Rotated(live))
            }
        }
    }

    async fn find(&self, token_hash: &str) -> OidcResult<Option<RefreshTokenRecord>> {
        Ok(self.tokens.read().await.get(token_hash).cloned())
    }

    async fn revoke_lineage(&self, id: Uuid) -> OidcResult<usize> {
        let mut tokens = self.tokens.write().await;
        let now = Utc::now();
        let family = lineage_ids(&tokens, id);
        let mut revoked = 0;
        for record in tokens.values_mut() {
            if family.contains(&record.id) && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn sweep_expired(&self) -> OidcResult<usize> {
        let mut tokens = self.tokens.write().await;
        let now = Utc::now();
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired(now));
        Ok(before - tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(token: &str) -> RefreshTokenRecord {
        RefreshTokenRecord::new(
            token,
            "user-1",
            "app1",
            vec!["openid".into(), "offline_access".into()],
            Utc::now(),
            Duration::days(30),
        )
    }

    #[tokio::test]
    async fn rotation_revokes_the_presented_token() {
        let store = InMemoryRefreshTokenStore::new();
        store.put(record("r1")).await.unwrap();

        let consumed = store.consume(&hash_token("r1")).await.unwrap();
        let rotated = match consumed {
            RefreshConsume::Rotated(rec) => rec,
            other => panic!("expected Rotated, got {other:?}"),
        };
        store
            .put(RefreshTokenRecord::rotated("r2", &rotated, Duration::days(30)))
            .await
            .unwrap();

        // r1 is now revoked; presenting it again reads as reuse.
        assert!(matches!(
            store.consume(&hash_token("r1")).await.unwrap(),
            RefreshConsume::ReuseDetected(_)
        ));
    }

    #[tokio::test]
    async fn reuse_revokes_the_whole_lineage() {
        let store = InMemoryRefreshTokenStore::new();
        let r1 = record("r1");
        let r1_id = r1.id;
        store.put(r1).await.unwrap();

        let RefreshConsume::Rotated(r1_live) = store.consume(&hash_token("r1")).await.unwrap()
        else {
            panic!("r1 should rotate");
        };
        let r2 = RefreshTokenRecord::rotated("r2", &r1_live, Duration::days(30));
        store.put(r2).await.unwrap();

        // Attacker replays r1: revoke the family, including live r2.
        let revoked = store.revoke_lineage(r1_id).await.unwrap();
        assert_eq!(revoked, 1); // r1 already revoked by rotation; r2 newly revoked
        assert!(matches!(
            store.consume(&hash_token("r2")).await.unwrap(),
            RefreshConsume::ReuseDetected(_)
        ));
    }

    #[tokio::test]
    async fn unknown_and_expired_tokens_are_unknown() {
        let store = InMemoryRefreshTokenStore::new();
        assert!(matches!(
            store.consume(&hash_token("ghost")).await.unwrap(),
            RefreshConsume::Unknown
        ));

        let mut expired = record("old");
        expired.expires_at = Utc::now() - Duration::seconds(1);
        store.put(expired).await.unwrap();
        assert!(matches!(
            store.consume(&hash_token("old")).await.unwrap(),
            RefreshConsume::Unknown
        ));
    }

    #[tokio::test]
    async fn lineage_walks_both_directions() {
        let store = InMemoryRefreshTokenStore::new();
        let r1 = record("r1");
        store.put(r1.clone()).await.unwrap();
        let r2 = RefreshTokenRecord::rotated("r2", &r1, Duration::days(30));
        store.put(r2.clone()).await.unwrap();
        let r3 = RefreshTokenRecord::rotated("r3", &r2, Duration::days(30));
        let r3_id = r3.id;
        store.put(r3).await.unwrap();

        // Revoking from the newest member reaches the root.
        let revoked = store.revoke_lineage(r3_id).await.unwrap();
        assert_eq!(revoked, 3);
        for token in ["r1", "r2", "r3"] {
            assert!(matches!(
                store.consume(&hash_token(token)).await.unwrap(),
                RefreshConsume::ReuseDetected(_)
            ));
        }
    }

    #[tokio::test]
    async fn sweep_reaps_expired_tokens() {
        let store = InMemoryRefreshTokenStore::new();
        store.put(record("live")).await.unwrap();
        let mut dead = record("dead");
        dead.expires_at = Utc::now() - Duration::seconds(1);
        store.put(dead).await.unwrap();
        assert_eq!(store.sweep_expired().await.unwrap(), 1);
    }
}
