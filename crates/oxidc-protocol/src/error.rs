//! Protocol error types following RFC 6749 and OIDC Core.
//!
//! Wire-facing messages stay generic so that no endpoint becomes an
//! enumeration oracle; the specific failed sub-check is logged
//! server-side at the point of failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use oxidc_model::ProviderError;

/// Result type for protocol operations.
pub type OidcResult<T> = Result<T, OidcError>;

/// OAuth 2.0 / OIDC protocol errors (RFC 6749 §5.2).
#[derive(Debug, Error)]
pub enum OidcError {
    /// Malformed request, missing or invalid parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed.
    #[error("Invalid client: {0}")]
    InvalidClient(String),

    /// Invalid, expired, consumed, or mismatched grant material.
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// Client is not authorized to use this grant type or operation.
    #[error("Unauthorized client: {0}")]
    UnauthorizedClient(String),

    /// Grant type not supported by this server.
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Requested scope is invalid or exceeds what was granted.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// Response type not supported by this server.
    #[error("Unsupported response type: {0}")]
    UnsupportedResponseType(String),

    /// Bearer token is invalid, expired, or revoked.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Bearer token lacks a required scope.
    #[error("Insufficient scope: {0}")]
    InsufficientScope(String),

    /// Internal failure; detail is logged, never returned.
    #[error("Server error: {0}")]
    ServerError(String),

    /// A collaborator is temporarily unreachable.
    #[error("Temporarily unavailable: {0}")]
    TemporarilyUnavailable(String),
}

impl OidcError {
    /// The RFC 6749 / RFC 6750 error code for the wire response.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnauthorizedClient(_) => "unauthorized_client",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::UnsupportedResponseType(_) => "unsupported_response_type",
            Self::InvalidToken(_) => "invalid_token",
            Self::InsufficientScope(_) => "insufficient_scope",
            Self::ServerError(_) => "server_error",
            Self::TemporarilyUnavailable(_) => "temporarily_unavailable",
        }
    }

    /// The HTTP status code for the wire response.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidGrant(_)
            | Self::UnauthorizedClient(_)
            | Self::UnsupportedGrantType(_)
            | Self::InvalidScope(_)
            | Self::UnsupportedResponseType(_) => 400,
            Self::InvalidClient(_) | Self::InvalidToken(_) => 401,
            Self::InsufficientScope(_) => 403,
            Self::ServerError(_) => 500,
            Self::TemporarilyUnavailable(_) => 503,
        }
    }

    /// Builds the JSON error body for the wire.
    ///
    /// Internal failures carry no description at all; everything else
    /// carries only the generic message.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        let description = match self {
            Self::ServerError(_) | Self::TemporarilyUnavailable(_) => None,
            Self::InvalidRequest(msg)
            | Self::InvalidClient(msg)
            | Self::InvalidGrant(msg)
            | Self::UnauthorizedClient(msg)
            | Self::UnsupportedGrantType(msg)
            | Self::InvalidScope(msg)
            | Self::UnsupportedResponseType(msg)
            | Self::InvalidToken(msg)
            | Self::InsufficientScope(msg) => Some(msg.clone()),
        };
        ErrorResponse {
            error: self.error_code().to_string(),
            error_description: description,
        }
    }
}

impl From<ProviderError> for OidcError {
    fn from(err: ProviderError) -> Self {
        tracing::error!(error = %err, "external collaborator failure");
        match err {
            ProviderError::Unavailable(_) => {
                Self::TemporarilyUnavailable("service unavailable".to_string())
            }
            ProviderError::Data(_) => Self::ServerError("internal error".to_string()),
        }
    }
}

/// The OAuth error object returned from endpoints (RFC 6749 §5.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable detail, deliberately generic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}
