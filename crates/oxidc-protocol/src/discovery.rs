//! OpenID Provider Metadata for `/.well-known/openid-configuration`
//! (OIDC Discovery 1.0 §3).
//!
//! The document is assembled purely from static capabilities; it has
//! no per-request state and may be cached aggressively by clients.

use serde::{Deserialize, Serialize};

use oxidc_crypto::SignatureAlgorithm;

use crate::types::scopes;

/// The provider metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Issuer URL; all endpoint URLs hang off it.
    pub issuer: String,
    /// Authorization endpoint URL.
    pub authorization_endpoint: String,
    /// Token endpoint URL.
    pub token_endpoint: String,
    /// UserInfo endpoint URL.
    pub userinfo_endpoint: String,
    /// Token revocation endpoint URL (RFC 7009).
    pub revocation_endpoint: String,
    /// JWKS URL.
    pub jwks_uri: String,
    /// Supported response types; only the code flow.
    pub response_types_supported: Vec<String>,
    /// Supported response modes.
    pub response_modes_supported: Vec<String>,
    /// Supported grant types.
    pub grant_types_supported: Vec<String>,
    /// Supported subject identifier types.
    pub subject_types_supported: Vec<String>,
    /// ID token signing algorithms.
    pub id_token_signing_alg_values_supported: Vec<String>,
    /// Scopes this server understands.
    pub scopes_supported: Vec<String>,
    /// Client authentication methods at the token endpoint.
    pub token_endpoint_auth_methods_supported: Vec<String>,
    /// Claims this server can release.
    pub claims_supported: Vec<String>,
    /// PKCE challenge methods.
    pub code_challenge_methods_supported: Vec<String>,
}

/// Builds [`ProviderMetadata`] from an issuer URL.
pub struct ProviderMetadataBuilder {
    issuer: String,
}

impl ProviderMetadataBuilder {
    /// Starts a builder for the given issuer. A trailing slash on the
    /// issuer is dropped so endpoint URLs stay canonical.
    #[must_use]
    pub fn new(issuer: &str) -> Self {
        Self {
            issuer: issuer.trim_end_matches('/').to_string(),
        }
    }

    /// Assembles the metadata document.
    #[must_use]
    pub fn build(self) -> ProviderMetadata {
        let issuer = self.issuer;
        ProviderMetadata {
            authorization_endpoint: format!("{issuer}/authorize"),
            token_endpoint: format!("{issuer}/token"),
            userinfo_endpoint: format!("{issuer}/userinfo"),
            revocation_endpoint: format!("{issuer}/revoke"),
            jwks_uri: format!("{issuer}/jwks"),
            issuer,
            response_types_supported: vec!["code".to_string()],
            response_modes_supported: vec!["query".to_string()],
            grant_types_supported: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
                "client_credentials".to_string(),
            ],
            subject_types_supported: vec!["public".to_string()],
            id_token_signing_alg_values_supported: SignatureAlgorithm::ALL
                .iter()
                .map(ToString::to_string)
                .collect(),
            scopes_supported: vec![
                scopes::OPENID.to_string(),
                scopes::PROFILE.to_string(),
                scopes::EMAIL.to_string(),
                scopes::ADDRESS.to_string(),
                scopes::PHONE.to_string(),
                scopes::OFFLINE_ACCESS.to_string(),
                scopes::GROUPS.to_string(),
                scopes::ROLES.to_string(),
            ],
            token_endpoint_auth_methods_supported: vec![
                "client_secret_basic".to_string(),
                "client_secret_post".to_string(),
            ],
            claims_supported: vec![
                "iss", "sub", "aud", "exp", "iat", "auth_time", "nonce", "name", "given_name",
                "family_name", "preferred_username", "locale", "zoneinfo", "updated_at", "email",
                "email_verified", "phone_number", "phone_number_verified", "address", "groups",
                "roles",
            ]
            .into_iter()
            .map(ToString::to_string)
            .collect(),
            code_challenge_methods_supported: vec!["S256".to_string(), "plain".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_derive_from_the_issuer() {
        let meta = ProviderMetadataBuilder::new("https://auth.example/").build();
        assert_eq!(meta.issuer, "https://auth.example");
        assert_eq!(meta.authorization_endpoint, "https://auth.example/authorize");
        assert_eq!(meta.token_endpoint, "https://auth.example/token");
        assert_eq!(meta.jwks_uri, "https://auth.example/jwks");
        assert_eq!(
            meta.revocation_endpoint,
            "https://auth.example/revoke"
        );
    }

    #[test]
    fn advertises_only_the_code_flow() {
        let meta = ProviderMetadataBuilder::new("https://auth.example").build();
        assert_eq!(meta.response_types_supported, vec!["code"]);
        assert!(meta
            .grant_types_supported
            .contains(&"client_credentials".to_string()));
        assert!(!meta.grant_types_supported.contains(&"password".to_string()));
        assert_eq!(meta.code_challenge_methods_supported, vec!["S256", "plain"]);
    }

    #[test]
    fn serializes_to_the_wire_shape() {
        let meta = ProviderMetadataBuilder::new("https://auth.example").build();
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["subject_types_supported"][0], "public");
        assert_eq!(json["id_token_signing_alg_values_supported"][0], "RS256");
    }
}
