//! Grant handlers for the token endpoint.
//!
//! Each grant type is an independent strategy over a shared
//! [`GrantContext`], so every arm is testable without HTTP plumbing.
//! Single-use artifacts are consumed before any token is minted; a
//! client retrying after a timeout can burn its code but can never
//! obtain two token sets from it.

use chrono::Duration;

use oxidc_model::{Client, DirectoryProvider, DirectoryUser};

use crate::error::{OidcError, OidcResult};
use crate::pkce::PkceVerifier;
use crate::resolver::ClaimsResolver;
use crate::store::{
    hash_code, hash_token, AuthorizationCodeStore, NonceStore, RefreshConsume,
    RefreshTokenRecord, RefreshTokenStore, StoredAuthCode,
};
use crate::token::{IdTokenParams, TokenIssuer, TokenResponse};
use crate::types::scopes;

/// Shared collaborators for grant handling.
pub struct GrantContext<'a> {
    /// Token issuance.
    pub issuer: &'a TokenIssuer,
    /// Authorization code store.
    pub codes: &'a dyn AuthorizationCodeStore,
    /// Refresh token store.
    pub refresh_tokens: &'a dyn RefreshTokenStore,
    /// Nonce store.
    pub nonces: &'a dyn NonceStore,
    /// Directory collaborator for claims resolution.
    pub directory: &'a dyn DirectoryProvider,
    /// Lifetime for newly issued refresh tokens.
    pub refresh_token_lifetime: Duration,
}

impl GrantContext<'_> {
    async fn resolve_user(&self, user_id: &str) -> OidcResult<DirectoryUser> {
        self.directory
            .lookup_user(user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(%user_id, "grant references a user the directory no longer knows");
                OidcError::InvalidGrant("grant is no longer valid".to_string())
            })
    }

    /// Builds the response tokens shared by the user-context grants.
    async fn issue_user_tokens(
        &self,
        client: &Client,
        code: &StoredAuthCode,
        presented_code: Option<&str>,
    ) -> OidcResult<TokenResponse> {
        let scope_str = code.scope.join(" ");
        let access_token =
            self.issuer
                .issue_access_token(&code.user_id, &client.client_id, &scope_str)?;

        let id_token = if code.scope.iter().any(|s| s == scopes::OPENID) {
            let user = self.resolve_user(&code.user_id).await?;
            let resolved = ClaimsResolver::resolve(&user, &code.scope);
            Some(self.issuer.issue_id_token(IdTokenParams {
                subject: &code.user_id,
                client_id: &client.client_id,
                nonce: code.nonce.as_deref(),
                auth_time: code.auth_time,
                resolved_claims: resolved,
                access_token: Some(&access_token),
                code: presented_code,
            })?)
        } else {
            None
        };

        let refresh_token = if code.scope.iter().any(|s| s == scopes::OFFLINE_ACCESS) {
            let token = oxidc_crypto::random::generate_refresh_token();
            self.refresh_tokens
                .put(RefreshTokenRecord::new(
                    &token,
                    code.user_id.clone(),
                    client.client_id.clone(),
                    code.scope.clone(),
                    code.auth_time,
                    self.refresh_token_lifetime,
                ))
                .await?;
            Some(token)
        } else {
            None
        };

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.issuer.access_token_lifetime_secs(),
            refresh_token,
            id_token,
            scope: scope_str,
        })
    }
}

/// The `authorization_code` grant (RFC 6749 §4.1.3, RFC 7636 §4.6).
pub struct AuthorizationCodeGrant;

impl AuthorizationCodeGrant {
    /// Redeems an authorization code for tokens.
    pub async fn handle(
        ctx: &GrantContext<'_>,
        client: &Client,
        code: Option<&str>,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
    ) -> OidcResult<TokenResponse> {
        let code = code
            .ok_or_else(|| OidcError::InvalidRequest("code is required".to_string()))?;
        let redirect_uri = redirect_uri
            .ok_or_else(|| OidcError::InvalidRequest("redirect_uri is required".to_string()))?;

        // Atomic check-and-mark; a replayed or raced code loses here.
        let stored = ctx.codes.consume(&hash_code(code)).await?.ok_or_else(|| {
            tracing::warn!(client_id = %client.client_id, "authorization code replay or unknown code");
            OidcError::InvalidGrant("invalid authorization code".to_string())
        })?;

        if stored.client_id != client.client_id {
            tracing::warn!(
                issued_to = %stored.client_id,
                presented_by = %client.client_id,
                "authorization code presented by a different client"
            );
            return Err(OidcError::InvalidGrant(
                "invalid authorization code".to_string(),
            ));
        }
        if stored.redirect_uri != redirect_uri {
            tracing::warn!(client_id = %client.client_id, "redirect_uri mismatch at redemption");
            return Err(OidcError::InvalidGrant(
                "invalid authorization code".to_string(),
            ));
        }

        if let Some(challenge) = &stored.code_challenge {
            let verifier = code_verifier.ok_or_else(|| {
                OidcError::InvalidRequest("code_verifier is required".to_string())
            })?;
            PkceVerifier::verify(verifier, challenge, stored.code_challenge_method)?;
        }

        // The nonce bound at authorize time must still be consumable;
        // losing this race means another exchange already embedded it.
        if let Some(nonce) = &stored.nonce {
            if !ctx.nonces.consume(nonce, &client.client_id).await? {
                tracing::warn!(client_id = %client.client_id, "nonce replay detected at token exchange");
                return Err(OidcError::InvalidGrant(
                    "invalid authorization code".to_string(),
                ));
            }
        }

        ctx.issue_user_tokens(client, &stored, Some(code)).await
    }
}

/// The `refresh_token` grant with rotation (RFC 6749 §6).
pub struct RefreshTokenGrant;

impl RefreshTokenGrant {
    /// Rotates a refresh token, issuing a fresh token set.
    pub async fn handle(
        ctx: &GrantContext<'_>,
        client: &Client,
        refresh_token: Option<&str>,
        requested_scope: Option<&str>,
    ) -> OidcResult<TokenResponse> {
        let presented = refresh_token
            .ok_or_else(|| OidcError::InvalidRequest("refresh_token is required".to_string()))?;

        let record = match ctx.refresh_tokens.consume(&hash_token(presented)).await? {
            RefreshConsume::Rotated(record) => record,
            RefreshConsume::ReuseDetected(record) => {
                let revoked = ctx.refresh_tokens.revoke_lineage(record.id).await?;
                tracing::warn!(
                    client_id = %record.client_id,
                    user_id = %record.user_id,
                    lineage_revoked = revoked,
                    "revoked refresh token replayed; lineage revoked"
                );
                return Err(OidcError::InvalidGrant(
                    "invalid refresh token".to_string(),
                ));
            }
            RefreshConsume::Unknown => {
                tracing::warn!(client_id = %client.client_id, "unknown or expired refresh token");
                return Err(OidcError::InvalidGrant(
                    "invalid refresh token".to_string(),
                ));
            }
        };

        if record.client_id != client.client_id {
            tracing::warn!(
                issued_to = %record.client_id,
                presented_by = %client.client_id,
                "refresh token presented by a different client"
            );
            ctx.refresh_tokens.revoke_lineage(record.id).await?;
            return Err(OidcError::InvalidGrant(
                "invalid refresh token".to_string(),
            ));
        }

        // Scope may only narrow on refresh.
        let granted: Vec<String> = match requested_scope {
            Some(requested) => {
                let requested: Vec<String> =
                    requested.split_whitespace().map(ToString::to_string).collect();
                if !requested.iter().all(|s| record.scope.contains(s)) {
                    return Err(OidcError::InvalidScope(
                        "scope exceeds the original grant".to_string(),
                    ));
                }
                requested
            }
            None => record.scope.clone(),
        };
        let scope_str = granted.join(" ");

        let access_token =
            ctx.issuer
                .issue_access_token(&record.user_id, &client.client_id, &scope_str)?;

        let id_token = if granted.iter().any(|s| s == scopes::OPENID) {
            let user = ctx.resolve_user(&record.user_id).await?;
            let resolved = ClaimsResolver::resolve(&user, &granted);
            Some(ctx.issuer.issue_id_token(IdTokenParams {
                subject: &record.user_id,
                client_id: &client.client_id,
                nonce: None,
                auth_time: record.auth_time,
                resolved_claims: resolved,
                access_token: Some(&access_token),
                code: None,
            })?)
        } else {
            None
        };

        let successor = oxidc_crypto::random::generate_refresh_token();
        ctx.refresh_tokens
            .put(RefreshTokenRecord::rotated(
                &successor,
                &record,
                ctx.refresh_token_lifetime,
            ))
            .await?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: ctx.issuer.access_token_lifetime_secs(),
            refresh_token: Some(successor),
            id_token,
            scope: scope_str,
        })
    }
}

/// The `client_credentials` grant (RFC 6749 §4.4).
///
/// Service identity only: no end user, hence never an ID token and
/// never a refresh token, whatever scopes were requested.
pub struct ClientCredentialsGrant;

impl ClientCredentialsGrant {
    /// Issues a service access token for a confidential client.
    pub async fn handle(
        ctx: &GrantContext<'_>,
        client: &Client,
        requested_scope: Option<&str>,
    ) -> OidcResult<TokenResponse> {
        if !client.confidential {
            return Err(OidcError::UnauthorizedClient(
                "client may not use this grant type".to_string(),
            ));
        }

        // openid/offline_access have no meaning without an end user;
        // drop them silently rather than failing the request. An absent
        // scope parameter falls back to everything the client is
        // registered for (RFC 6749 §3.3 default scope).
        let granted: Vec<String> = match requested_scope {
            Some(requested) => requested
                .split_whitespace()
                .filter(|s| *s != scopes::OPENID && *s != scopes::OFFLINE_ACCESS)
                .map(ToString::to_string)
                .collect(),
            None => {
                let mut defaults: Vec<String> = client
                    .allowed_scopes
                    .iter()
                    .filter(|s| s.as_str() != scopes::OPENID && s.as_str() != scopes::OFFLINE_ACCESS)
                    .cloned()
                    .collect();
                defaults.sort();
                defaults
            }
        };
        if !client.allows_scopes(granted.iter().map(String::as_str)) {
            return Err(OidcError::InvalidScope(
                "scope not allowed for this client".to_string(),
            ));
        }
        let scope_str = granted.join(" ");

        let access_token =
            ctx.issuer
                .issue_access_token(&client.client_id, &client.client_id, &scope_str)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: ctx.issuer.access_token_lifetime_secs(),
            refresh_token: None,
            id_token: None,
            scope: scope_str,
        })
    }
}
