//! Token issuance and validation.
//!
//! Access tokens are short-lived signed JWTs. ID tokens follow OIDC
//! Core: `at_hash`/`c_hash` are the base64url-encoded left half of the
//! SHA-2 digest selected by the signing algorithm, computed over the
//! paired access token / authorization code.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use oxidc_crypto::{hash, SignatureAlgorithm};

use crate::claims::{AccessTokenClaims, IdTokenClaims};
use crate::error::{OidcError, OidcResult};
use crate::keyring::{jwt_algorithm, SigningKeyManager};

/// Clock skew tolerance on `iat`/`exp`/`auth_time`, in seconds.
pub const CLOCK_SKEW_LEEWAY_SECS: u64 = 300;

/// Left-half token hash per OIDC Core §3.1.3.6: the digest function is
/// the one paired with the signing algorithm, and the encoded value is
/// the first half of the digest, base64url without padding.
#[must_use]
pub fn compute_token_hash(alg: SignatureAlgorithm, value: &str) -> String {
    let digest = match alg {
        SignatureAlgorithm::Rs256 => hash::sha256(value.as_bytes()),
        SignatureAlgorithm::Rs384 => hash::sha384(value.as_bytes()),
        SignatureAlgorithm::Rs512 => hash::sha512(value.as_bytes()),
    };
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

/// Static issuance configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Issuer URL, the `iss` claim of everything signed here.
    pub issuer: String,
    /// Access token lifetime.
    pub access_token_lifetime: Duration,
    /// ID token lifetime.
    pub id_token_lifetime: Duration,
}

/// The successful token endpoint response (RFC 6749 §5.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Rotating refresh token, when `offline_access` was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// ID token, when `openid` was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Space-delimited granted scopes.
    pub scope: String,
}

/// Inputs for ID token issuance.
pub struct IdTokenParams<'a> {
    /// Token subject: the authenticated user id.
    pub subject: &'a str,
    /// Audience client.
    pub client_id: &'a str,
    /// Nonce from the original authorize request, if any.
    pub nonce: Option<&'a str>,
    /// When the user actively authenticated.
    pub auth_time: DateTime<Utc>,
    /// Scope-gated claims from the resolver.
    pub resolved_claims: Map<String, Value>,
    /// Paired access token, hashed into `at_hash` when present.
    pub access_token: Option<&'a str>,
    /// Paired authorization code, hashed into `c_hash` when present.
    pub code: Option<&'a str>,
}

/// Distinct internal ID-token validation failures.
///
/// Endpoints log these and surface only a generic `invalid_grant` /
/// `invalid_token` on the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdTokenValidationError {
    /// The token is not parseable JWS at all.
    #[error("malformed token")]
    Malformed,
    /// Header `kid` references no published, unexpired key.
    #[error("unknown signing key: {0}")]
    UnknownKey(String),
    /// Signature does not verify.
    #[error("signature mismatch")]
    Signature,
    /// `iss` does not match this server.
    #[error("issuer mismatch")]
    Issuer,
    /// `aud` does not include the expected client.
    #[error("audience mismatch")]
    Audience,
    /// The token is expired beyond the skew allowance.
    #[error("token expired")]
    Expired,
    /// `nonce` does not equal the expected value.
    #[error("nonce mismatch")]
    NonceMismatch,
    /// `at_hash` does not match the supplied access token.
    #[error("at_hash mismatch")]
    AtHashMismatch,
}

/// Issues signed access and ID tokens using the active signing key.
pub struct TokenIssuer {
    config: TokenConfig,
    keys: Arc<SigningKeyManager>,
}

impl TokenIssuer {
    /// Creates an issuer over a signing-key manager.
    #[must_use]
    pub const fn new(config: TokenConfig, keys: Arc<SigningKeyManager>) -> Self {
        Self { config, keys }
    }

    /// The issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// Access token lifetime in whole seconds, for `expires_in`.
    #[must_use]
    pub fn access_token_lifetime_secs(&self) -> i64 {
        self.config.access_token_lifetime.num_seconds()
    }

    /// Issues a signed access token.
    pub fn issue_access_token(
        &self,
        subject: &str,
        client_id: &str,
        scope: &str,
    ) -> OidcResult<String> {
        let claims = AccessTokenClaims::new(
            self.config.issuer.clone(),
            subject,
            client_id,
            scope,
            self.config.access_token_lifetime,
        )
        .with_authorized_party(client_id);
        self.keys.sign(&claims)
    }

    /// Issues a signed ID token.
    pub fn issue_id_token(&self, params: IdTokenParams<'_>) -> OidcResult<String> {
        let alg = self.keys.algorithm();
        let mut claims = IdTokenClaims::new(
            self.config.issuer.clone(),
            params.subject,
            params.client_id,
            self.config.id_token_lifetime,
        )
        .with_auth_time(params.auth_time)
        .with_authorized_party(params.client_id)
        .with_claims(params.resolved_claims);

        if let Some(nonce) = params.nonce {
            claims = claims.with_nonce(nonce);
        }
        if let Some(access_token) = params.access_token {
            claims = claims.with_at_hash(compute_token_hash(alg, access_token));
        }
        if let Some(code) = params.code {
            claims = claims.with_c_hash(compute_token_hash(alg, code));
        }
        self.keys.sign(&claims)
    }

    /// Validates an ID token this server issued.
    ///
    /// Resolves the header `kid` against every non-expired key, so
    /// tokens signed before a rotation keep validating through the
    /// grace period.
    ///
    /// The nonce check is strict in both directions: a token carrying
    /// a nonce validates only when that same nonce is expected, and a
    /// token without one only when no nonce is expected. A stray nonce
    /// means the token was minted for a different request context.
    pub fn validate_id_token(
        &self,
        token: &str,
        client_id: &str,
        expected_nonce: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<IdTokenClaims, IdTokenValidationError> {
        let header = decode_header(token).map_err(|_| IdTokenValidationError::Malformed)?;
        let kid = header.kid.ok_or(IdTokenValidationError::Malformed)?;
        let (alg, key) = self
            .keys
            .decoding_key(&kid)
            .ok_or(IdTokenValidationError::UnknownKey(kid))?;

        let mut validation = Validation::new(jwt_algorithm(alg));
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;
        validation.set_audience(&[client_id]);
        validation.set_issuer(&[&self.config.issuer]);

        let data =
            decode::<IdTokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => IdTokenValidationError::Expired,
                ErrorKind::InvalidIssuer => IdTokenValidationError::Issuer,
                ErrorKind::InvalidAudience => IdTokenValidationError::Audience,
                ErrorKind::InvalidSignature => IdTokenValidationError::Signature,
                _ => IdTokenValidationError::Malformed,
            })?;
        let claims = data.claims;

        if claims.nonce.as_deref() != expected_nonce {
            return Err(IdTokenValidationError::NonceMismatch);
        }
        if let Some(access_token) = access_token {
            let expected = compute_token_hash(alg, access_token);
            if claims.at_hash.as_deref() != Some(expected.as_str()) {
                return Err(IdTokenValidationError::AtHashMismatch);
            }
        }
        Ok(claims)
    }
}

/// Verifies bearer access tokens for resource-server use (userinfo and
/// anything else fronted by this server's JWKS).
pub struct TokenValidator {
    issuer: String,
    keys: Arc<SigningKeyManager>,
}

impl TokenValidator {
    /// Creates a validator over the published key set.
    #[must_use]
    pub const fn new(issuer: String, keys: Arc<SigningKeyManager>) -> Self {
        Self { issuer, keys }
    }

    /// Validates a bearer access token, returning its claims.
    ///
    /// All failures collapse to `invalid_token` on the wire; the
    /// specific cause is logged here.
    pub fn validate_bearer(&self, token: &str) -> OidcResult<AccessTokenClaims> {
        let generic = || OidcError::InvalidToken("invalid access token".to_string());

        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "bearer token not parseable");
            generic()
        })?;
        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("bearer token missing kid");
            generic()
        })?;
        let (alg, key) = self.keys.decoding_key(&kid).ok_or_else(|| {
            tracing::warn!(%kid, "bearer token references unknown signing key");
            generic()
        })?;

        let mut validation = Validation::new(jwt_algorithm(alg));
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<AccessTokenClaims>(token, &key, &validation).map_err(|e| {
            tracing::warn!(error = %e, "bearer token validation failed");
            generic()
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> (TokenIssuer, Arc<SigningKeyManager>) {
        let keys = Arc::new(SigningKeyManager::new(SignatureAlgorithm::Rs256).unwrap());
        let config = TokenConfig {
            issuer: "https://auth.example".to_string(),
            access_token_lifetime: Duration::hours(1),
            id_token_lifetime: Duration::minutes(5),
        };
        (TokenIssuer::new(config, Arc::clone(&keys)), keys)
    }

    fn id_params<'a>(
        access_token: Option<&'a str>,
        nonce: Option<&'a str>,
    ) -> IdTokenParams<'a> {
        IdTokenParams {
            subject: "user-1",
            client_id: "app1",
            nonce,
            auth_time: Utc::now(),
            resolved_claims: Map::new(),
            access_token,
            code: None,
        }
    }

    #[test]
    fn at_hash_is_left_half_of_sha256_for_rs256() {
        let token = "some-access-token";
        let digest = hash::sha256(token.as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(&digest[..16]);
        assert_eq!(
            compute_token_hash(SignatureAlgorithm::Rs256, token),
            expected
        );
        // Longer digests for the stronger algorithms.
        assert_eq!(
            compute_token_hash(SignatureAlgorithm::Rs384, token).len(),
            32
        );
        assert_eq!(
            compute_token_hash(SignatureAlgorithm::Rs512, token).len(),
            43
        );
    }

    #[test]
    fn id_token_round_trip_recovers_claims() {
        let (issuer, _keys) = issuer();
        let mut resolved = Map::new();
        resolved.insert("email".into(), Value::String("u@example.com".into()));

        let access = issuer
            .issue_access_token("user-1", "app1", "openid email")
            .unwrap();
        let token = issuer
            .issue_id_token(IdTokenParams {
                resolved_claims: resolved,
                ..id_params(Some(&access), Some("n-1"))
            })
            .unwrap();

        let claims = issuer
            .validate_id_token(&token, "app1", Some("n-1"), Some(&access))
            .unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.iss, "https://auth.example");
        assert_eq!(claims.nonce.as_deref(), Some("n-1"));
        assert_eq!(
            claims.additional.get("email"),
            Some(&Value::String("u@example.com".into()))
        );
        assert!(claims.auth_time.is_some());
    }

    #[test]
    fn tampered_signature_fails() {
        let (issuer, _keys) = issuer();
        let token = issuer.issue_id_token(id_params(None, None)).unwrap();
        let mut tampered = token.clone();
        // Flip the last signature character.
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(
            issuer.validate_id_token(&tampered, "app1", None, None),
            Err(IdTokenValidationError::Signature)
        );
    }

    #[test]
    fn audience_and_nonce_mismatches_are_distinct() {
        let (issuer, _keys) = issuer();
        let token = issuer.issue_id_token(id_params(None, Some("n-1"))).unwrap();

        assert_eq!(
            issuer.validate_id_token(&token, "other-app", Some("n-1"), None),
            Err(IdTokenValidationError::Audience)
        );
        assert_eq!(
            issuer.validate_id_token(&token, "app1", Some("n-2"), None),
            Err(IdTokenValidationError::NonceMismatch)
        );
        assert_eq!(
            issuer.validate_id_token(&token, "app1", None, None),
            Err(IdTokenValidationError::NonceMismatch)
        );

        // And the other direction: expecting a nonce the token lacks.
        let bare = issuer.issue_id_token(id_params(None, None)).unwrap();
        assert_eq!(
            issuer.validate_id_token(&bare, "app1", Some("n-1"), None),
            Err(IdTokenValidationError::NonceMismatch)
        );
    }

    #[test]
    fn changing_the_access_token_invalidates_at_hash() {
        let (issuer, _keys) = issuer();
        let access = issuer
            .issue_access_token("user-1", "app1", "openid")
            .unwrap();
        let token = issuer
            .issue_id_token(id_params(Some(&access), None))
            .unwrap();

        assert!(issuer
            .validate_id_token(&token, "app1", None, Some(&access))
            .is_ok());
        assert_eq!(
            issuer.validate_id_token(&token, "app1", None, Some("a-different-token")),
            Err(IdTokenValidationError::AtHashMismatch)
        );
    }

    #[test]
    fn rotation_grace_keeps_old_tokens_valid() {
        let (issuer, keys) = issuer();
        let token = issuer.issue_id_token(id_params(None, None)).unwrap();

        keys.rotate(Duration::days(7)).unwrap();
        assert!(issuer.validate_id_token(&token, "app1", None, None).is_ok());

        // Rotate again with an already-expired grace on the middle key:
        // tokens signed by a key past its grace stop validating.
        let stale = issuer.issue_id_token(id_params(None, None)).unwrap();
        keys.rotate(Duration::seconds(-1)).unwrap();
        assert!(matches!(
            issuer.validate_id_token(&stale, "app1", None, None),
            Err(IdTokenValidationError::UnknownKey(_))
        ));
    }

    #[test]
    fn bearer_validation_accepts_access_tokens() {
        let (issuer, keys) = issuer();
        let validator = TokenValidator::new("https://auth.example".to_string(), keys);
        let access = issuer
            .issue_access_token("user-1", "app1", "openid profile")
            .unwrap();

        let claims = validator.validate_bearer(&access).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(claims.has_scope("profile"));
        assert_eq!(claims.azp.as_deref(), Some("app1"));

        assert!(validator.validate_bearer("not-a-jwt").is_err());
    }
}
