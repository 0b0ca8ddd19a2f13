//! Authorization code storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use oxidc_crypto::hash::sha256_base64url;

use crate::error::OidcResult;
use crate::types::CodeChallengeMethod;

/// Hashes an authorization code for storage and lookup.
#[must_use]
pub fn hash_code(code: &str) -> String {
    sha256_base64url(code.as_bytes())
}

/// A stored authorization code. The plaintext code never touches the
/// store; the record is keyed by its SHA-256.
#[derive(Debug, Clone)]
pub struct StoredAuthCode {
    /// Base64url SHA-256 of the code.
    pub code_hash: String,
    /// Client the code was issued to.
    pub client_id: String,
    /// Authenticated user the code represents.
    pub user_id: String,
    /// Redirect URI bound at authorize time; must match at redemption.
    pub redirect_uri: String,
    /// Granted scopes, in request order.
    pub scope: Vec<String>,
    /// PKCE challenge, when one was supplied.
    pub code_challenge: Option<String>,
    /// PKCE challenge method.
    pub code_challenge_method: CodeChallengeMethod,
    /// Nonce bound at authorize time.
    pub nonce: Option<String>,
    /// When the user actively authenticated.
    pub auth_time: DateTime<Utc>,
    /// Issuance instant.
    pub issued_at: DateTime<Utc>,
    /// Expiry instant (short TTL).
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, on redemption.
    pub consumed_at: Option<DateTime<Utc>>,
}

impl StoredAuthCode {
    /// Creates a record for a freshly minted code.
    #[must_use]
    pub fn new(
        code: &str,
        client_id: impl Into<String>,
        user_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: Vec<String>,
        auth_time: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            code_hash: hash_code(code),
            client_id: client_id.into(),
            user_id: user_id.into(),
            redirect_uri: redirect_uri.into(),
            scope,
            code_challenge: None,
            code_challenge_method: CodeChallengeMethod::default(),
            nonce: None,
            auth_time,
            issued_at: now,
            expires_at: now + ttl,
            consumed_at: None,
        }
    }

    /// Binds a PKCE challenge.
    #[must_use]
    pub fn with_pkce(mut self, challenge: impl Into<String>, method: CodeChallengeMethod) -> Self {
        self.code_challenge = Some(challenge.into());
        self.code_challenge_method = method;
        self
    }

    /// Binds a nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Whether the code has passed its TTL.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Persistence for authorization codes.
#[async_trait]
pub trait AuthorizationCodeStore: Send + Sync {
    /// Stores a freshly issued code.
    async fn put(&self, code: StoredAuthCode) -> OidcResult<()>;

    /// Atomically redeems a code by hash.
    ///
    /// Returns the record exactly once; `None` for unknown, expired,
    /// or already-consumed codes. Callers must treat `None` as a hard
    /// authentication failure.
    async fn consume(&self, code_hash: &str) -> OidcResult<Option<StoredAuthCode>>;

    /// Removes expired entries; returns how many were dropped.
    async fn sweep_expired(&self) -> OidcResult<usize>;
}

/// In-memory code store. The whole consume check runs under one write
/// guard, so concurrent redemptions serialize and exactly one wins.
#[derive(Default)]
pub struct InMemoryAuthorizationCodeStore {
    codes: RwLock<HashMap<String, StoredAuthCode>>,
}

impl InMemoryAuthorizationCodeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorizationCodeStore for InMemoryAuthorizationCodeStore {
    async fn put(&self, code: StoredAuthCode) -> OidcResult<()> {
        self.codes
            .write()
            .await
            .insert(code.code_hash.clone(), code);
        Ok(())
    }

    async fn consume(&self, code_hash: &str) -> OidcResult<Option<StoredAuthCode>> {
        let mut codes = self.codes.write().await;
        let now = Utc::now();
        match codes.get_mut(code_hash) {
            Some(entry) if entry.consumed_at.is_none() && !entry.is_expired(now) => {
                entry.consumed_at = Some(now);
                Ok(Some(entry.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn sweep_expired(&self) -> OidcResult<usize> {
        let mut codes = self.codes.write().await;
        let now = Utc::now();
        let before = codes.len();
        codes.retain(|_, c| !c.is_expired(now) && c.consumed_at.is_none());
        Ok(before - codes.len())
    }
}
