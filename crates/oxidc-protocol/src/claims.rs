//! JWT claim types for access and ID tokens.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `aud` claim: a single audience or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience string.
    Single(String),
    /// Multiple audiences.
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether the given audience is included.
    #[must_use]
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::Single(aud) => aud == audience,
            Self::Multiple(auds) => auds.iter().any(|a| a == audience),
        }
    }
}

impl From<String> for Audience {
    fn from(aud: String) -> Self {
        Self::Single(aud)
    }
}

impl From<&str> for Audience {
    fn from(aud: &str) -> Self {
        Self::Single(aud.to_string())
    }
}

/// Claims carried in a signed access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer URL.
    pub iss: String,
    /// Subject: the user id, or the client id for service tokens.
    pub sub: String,
    /// Audience.
    pub aud: Audience,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Unique token id.
    pub jti: String,
    /// Authorized party: the client the token was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    /// Space-delimited granted scopes.
    pub scope: String,
}

impl AccessTokenClaims {
    /// Creates claims for a token valid for `lifetime` from now.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<Audience>,
        scope: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: audience.into(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::now_v7().to_string(),
            azp: None,
            scope: scope.into(),
        }
    }

    /// Sets the authorized party.
    #[must_use]
    pub fn with_authorized_party(mut self, client_id: impl Into<String>) -> Self {
        self.azp = Some(client_id.into());
        self
    }

    /// The granted scopes as a list.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }

    /// Whether a scope was granted.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split_whitespace().any(|s| s == scope)
    }
}

/// Claims carried in a signed ID token (OIDC Core §2).
///
/// Scope-gated profile claims resolved from the directory are carried
/// in the flattened `additional` map rather than as named fields; the
/// protocol-level claims are explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer URL.
    pub iss: String,
    /// Subject: the authenticated user's id.
    pub sub: String,
    /// Audience: the client the token was issued to.
    pub aud: Audience,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// When the end user actively authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,
    /// Echo of the request nonce, when one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Authorized party.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    /// Left-half digest of the paired access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,
    /// Left-half digest of the paired authorization code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,
    /// Scope-gated claims from the claims resolver.
    #[serde(flatten, default)]
    pub additional: HashMap<String, Value>,
}

impl IdTokenClaims {
    /// Creates claims for a token valid for `lifetime` from now.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<Audience>,
        lifetime: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: audience.into(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            auth_time: None,
            nonce: None,
            azp: None,
            at_hash: None,
            c_hash: None,
            additional: HashMap::new(),
        }
    }

    /// Sets the authentication time.
    #[must_use]
    pub fn with_auth_time(mut self, auth_time: DateTime<Utc>) -> Self {
        self.auth_time = Some(auth_time.timestamp());
        self
    }

    /// Sets the nonce echo.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the authorized party.
    #[must_use]
    pub fn with_authorized_party(mut self, client_id: impl Into<String>) -> Self {
        self.azp = Some(client_id.into());
        self
    }

    /// Sets the access token hash.
    #[must_use]
    pub fn with_at_hash(mut self, at_hash: impl Into<String>) -> Self {
        self.at_hash = Some(at_hash.into());
        self
    }

    /// Sets the authorization code hash.
    #[must_use]
    pub fn with_c_hash(mut self, c_hash: impl Into<String>) -> Self {
        self.c_hash = Some(c_hash.into());
        self
    }

    /// Merges resolved scope-gated claims.
    #[must_use]
    pub fn with_claims(mut self, claims: serde_json::Map<String, Value>) -> Self {
        self.additional.extend(claims);
        self
    }
}
