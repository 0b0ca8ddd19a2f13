//! Request types for the protocol endpoints.

use serde::{Deserialize, Serialize};

use crate::types::Prompt;

/// Query parameters for `GET /authorize` (RFC 6749 §4.1.1, OIDC Core §3.1.2.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Requested response type; only `code` is supported.
    pub response_type: String,
    /// The requesting client.
    pub client_id: String,
    /// Where to send the user back to. Must exactly match a registered URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    /// Space-delimited requested scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Opaque client state echoed back on the redirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// One-time replay-protection value echoed in the ID token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// PKCE code challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,
    /// PKCE challenge method (`S256` or `plain`, defaults to `S256`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
    /// Space-delimited prompt directives (`login`, `none`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Maximum acceptable authentication age in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
}

impl AuthorizationRequest {
    /// The requested scopes as a list, preserving request order.
    #[must_use]
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(ToString::to_string)
            .collect()
    }

    /// Parsed prompt directives; unknown values are ignored.
    #[must_use]
    pub fn prompt_values(&self) -> Vec<Prompt> {
        self.prompt
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .filter_map(|p| p.parse().ok())
            .collect()
    }

    /// Whether the request forces re-authentication.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.prompt_values().contains(&Prompt::Login)
    }
}

/// Form body for `POST /token` (RFC 6749 §4.1.3, §6, §4.4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    /// The grant being exercised.
    pub grant_type: String,
    /// Authorization code (authorization_code grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Redirect URI used on the authorize request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    /// Client id when authenticating via the form body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Client secret when authenticating via the form body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// PKCE code verifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
    /// Refresh token (refresh_token grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Requested scope; on refresh this may only narrow the grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenRequest {
    /// The requested scopes as a list, preserving request order.
    #[must_use]
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(ToString::to_string)
            .collect()
    }
}

/// Form body for `POST /revoke` (RFC 7009 §2.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationRequest {
    /// The token to revoke.
    pub token: String,
    /// Optional hint: `refresh_token` or `access_token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type_hint: Option<String>,
    /// Client id when authenticating via the form body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Client secret when authenticating via the form body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_request_parses_from_query() {
        let req: AuthorizationRequest = serde_urlencoded::from_str(
            "response_type=code&client_id=app1&redirect_uri=https%3A%2F%2Fapp%2Fcb\
             &scope=openid%20profile&state=xyz&nonce=n-0S6&max_age=300&prompt=login",
        )
        .unwrap();
        assert_eq!(req.response_type, "code");
        assert_eq!(req.scopes(), vec!["openid", "profile"]);
        assert_eq!(req.max_age, Some(300));
        assert!(req.requires_login());
    }

    #[test]
    fn token_request_parses_from_form() {
        let req: TokenRequest = serde_urlencoded::from_str(
            "grant_type=authorization_code&code=abc&redirect_uri=https%3A%2F%2Fapp%2Fcb\
             &client_id=app1&code_verifier=dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk",
        )
        .unwrap();
        assert_eq!(req.grant_type, "authorization_code");
        assert_eq!(req.code.as_deref(), Some("abc"));
        assert!(req.client_secret.is_none());
    }

    #[test]
    fn missing_token_field_is_rejected() {
        let res: Result<RevocationRequest, _> =
            serde_urlencoded::from_str("token_type_hint=refresh_token");
        assert!(res.is_err());
    }
}
