//! Common protocol types: grant types, response types, PKCE methods,
//! prompt values, and well-known scope names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OAuth 2.0 grant types supported by the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization code grant (with PKCE).
    AuthorizationCode,
    /// Refresh token grant (with rotation).
    RefreshToken,
    /// Client credentials grant (service identity, no end user).
    ClientCredentials,
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
            Self::ClientCredentials => "client_credentials",
        };
        write!(f, "{s}")
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "refresh_token" => Ok(Self::RefreshToken),
            "client_credentials" => Ok(Self::ClientCredentials),
            other => Err(format!("unsupported grant type: {other}")),
        }
    }
}

/// Response types supported by the authorization endpoint.
///
/// Only the code flow is served; implicit and hybrid response types
/// are rejected with `unsupported_response_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Authorization code flow.
    Code,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code")
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            other => Err(format!("unsupported response type: {other}")),
        }
    }
}

/// PKCE code challenge methods (RFC 7636).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    /// Plain comparison. Allowed but discouraged.
    #[serde(rename = "plain")]
    Plain,
    /// SHA-256 of the verifier, base64url-encoded.
    #[default]
    #[serde(rename = "S256")]
    S256,
}

impl fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::S256 => write!(f, "S256"),
        }
    }
}

impl FromStr for CodeChallengeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            other => Err(format!("unsupported code challenge method: {other}")),
        }
    }
}

/// OIDC `prompt` parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// No interaction may occur.
    None,
    /// Force re-authentication.
    Login,
    /// Force the consent screen.
    Consent,
    /// Force account selection.
    SelectAccount,
}

impl FromStr for Prompt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "login" => Ok(Self::Login),
            "consent" => Ok(Self::Consent),
            "select_account" => Ok(Self::SelectAccount),
            other => Err(format!("unknown prompt value: {other}")),
        }
    }
}

/// Well-known scope names.
pub mod scopes {
    /// OIDC authentication scope; gates ID token issuance.
    pub const OPENID: &str = "openid";
    /// Profile claims (name, locale, ...).
    pub const PROFILE: &str = "profile";
    /// Email claims.
    pub const EMAIL: &str = "email";
    /// Structured address claim.
    pub const ADDRESS: &str = "address";
    /// Phone number claims.
    pub const PHONE: &str = "phone";
    /// Gates refresh token issuance.
    pub const OFFLINE_ACCESS: &str = "offline_access";
    /// Directory group memberships.
    pub const GROUPS: &str = "groups";
    /// Directory role assignments.
    pub const ROLES: &str = "roles";
}
