//! Registered OAuth 2.0 / OIDC clients.
//!
//! Clients are created and edited by an external admin collaborator and
//! are immutable for the duration of a request. Secrets are stored
//! hashed, never in plaintext.

use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use oxidc_crypto::hash::sha256_base64url;
use oxidc_crypto::SignatureAlgorithm;

use crate::error::ProviderError;

/// A registered client application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier (OAuth `client_id`).
    pub client_id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the client may be used at all.
    pub enabled: bool,
    /// Whether the client may use the OIDC surface (`openid` scope,
    /// ID tokens).
    pub oidc_enabled: bool,
    /// Confidential clients authenticate with a secret; public clients
    /// (SPAs, native apps) cannot keep one and must use PKCE.
    pub confidential: bool,
    /// Base64url SHA-256 of the client secret. Absent for public clients.
    #[serde(default)]
    pub secret_hash: Option<String>,
    /// Registered redirect URIs. Matching is exact, no wildcards.
    pub redirect_uris: HashSet<String>,
    /// Scopes this client may request.
    pub allowed_scopes: HashSet<String>,
    /// Preferred signing algorithm for tokens issued to this client.
    #[serde(default)]
    pub signing_alg: SignatureAlgorithm,
}

impl Client {
    /// Creates a confidential client, hashing the given secret.
    #[must_use]
    pub fn new_confidential(client_id: impl Into<String>, secret: &str) -> Self {
        Self {
            client_id: client_id.into(),
            name: None,
            enabled: true,
            oidc_enabled: true,
            confidential: true,
            secret_hash: Some(sha256_base64url(secret.as_bytes())),
            redirect_uris: HashSet::new(),
            allowed_scopes: HashSet::new(),
            signing_alg: SignatureAlgorithm::default(),
        }
    }

    /// Creates a public client (no secret, PKCE required).
    #[must_use]
    pub fn new_public(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            name: None,
            enabled: true,
            oidc_enabled: true,
            confidential: false,
            secret_hash: None,
            redirect_uris: HashSet::new(),
            allowed_scopes: HashSet::new(),
            signing_alg: SignatureAlgorithm::default(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a registered redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uris.insert(uri.into());
        self
    }

    /// Adds an allowed scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.allowed_scopes.insert(scope.into());
        self
    }

    /// Sets the preferred signing algorithm.
    #[must_use]
    pub const fn with_signing_alg(mut self, alg: SignatureAlgorithm) -> Self {
        self.signing_alg = alg;
        self
    }

    /// Verifies a presented client secret in constant time.
    ///
    /// Always false for clients without a stored secret.
    #[must_use]
    pub fn verify_secret(&self, candidate: &str) -> bool {
        match &self.secret_hash {
            Some(stored) => {
                let candidate_hash = sha256_base64url(candidate.as_bytes());
                candidate_hash.as_bytes().ct_eq(stored.as_bytes()).into()
            }
            None => false,
        }
    }

    /// Exact-match check against the registered redirect URIs.
    #[must_use]
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.contains(uri)
    }

    /// Whether every requested scope is allowed for this client.
    #[must_use]
    pub fn allows_scopes<'a>(&self, requested: impl IntoIterator<Item = &'a str>) -> bool {
        requested.into_iter().all(|s| self.allowed_scopes.contains(s))
    }
}

/// Read-only client lookup.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// Fetches a client by its `client_id`. `None` when unknown.
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>, ProviderError>;
}

/// A fixed, in-memory client registry.
///
/// The registry is built once at startup; clients are immutable during
/// requests, so no interior locking is needed.
pub struct StaticClientProvider {
    clients: HashMap<String, Client>,
}

impl StaticClientProvider {
    /// Builds a registry from a list of clients.
    #[must_use]
    pub fn new(clients: Vec<Client>) -> Self {
        Self {
            clients: clients
                .into_iter()
                .map(|c| (c.client_id.clone(), c))
                .collect(),
        }
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientProvider for StaticClientProvider {
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>, ProviderError> {
        Ok(self.clients.get(client_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidential_client_verifies_its_secret() {
        let client = Client::new_confidential("backend", "s3cr3t");
        assert!(client.confidential);
        assert!(client.verify_secret("s3cr3t"));
        assert!(!client.verify_secret("wrong"));
        assert!(!client.verify_secret(""));
    }

    #[test]
    fn public_client_never_verifies_a_secret() {
        let client = Client::new_public("spa");
        assert!(client.secret_hash.is_none());
        assert!(!client.verify_secret("anything"));
    }

    #[test]
    fn redirect_uri_matching_is_exact() {
        let client = Client::new_public("spa").with_redirect_uri("https://app.example/cb");
        assert!(client.has_redirect_uri("https://app.example/cb"));
        assert!(!client.has_redirect_uri("https://app.example/cb/"));
        assert!(!client.has_redirect_uri("https://app.example/cb?x=1"));
        assert!(!client.has_redirect_uri("https://evil.example/cb"));
    }

    #[test]
    fn scope_subset_check() {
        let client = Client::new_public("spa")
            .with_scope("openid")
            .with_scope("profile");
        assert!(client.allows_scopes(["openid"]));
        assert!(client.allows_scopes(["openid", "profile"]));
        assert!(!client.allows_scopes(["openid", "email"]));
    }

    #[test]
    fn secret_is_stored_hashed() {
        let client = Client::new_confidential("backend", "hunter2");
        let json = serde_json::to_string(&client).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[tokio::test]
    async fn static_provider_lookup() {
        let provider = StaticClientProvider::new(vec![Client::new_public("spa")]);
        assert_eq!(provider.len(), 1);
        assert!(provider.get_client("spa").await.unwrap().is_some());
        assert!(provider.get_client("ghost").await.unwrap().is_none());
    }
}
