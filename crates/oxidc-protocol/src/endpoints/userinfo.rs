//! The userinfo endpoint: `GET`/`POST /userinfo` (OIDC Core §5.3).
//!
//! Claims are gated twice: the bearer token must carry `openid`, and
//! only claims for the token's granted scopes are released.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resolver::ClaimsResolver;
use crate::types::scopes;

use super::state::ProviderState;

/// The userinfo response body: `sub` plus scope-gated claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfoResponse {
    /// Subject the claims describe.
    pub sub: String,
    /// Scope-gated claims.
    #[serde(flatten, default)]
    pub claims: Map<String, Value>,
}

/// Handles `GET /userinfo` and `POST /userinfo`.
pub async fn userinfo(State(state): State<ProviderState>, headers: HeaderMap) -> Response {
    let Some(token) = extract_bearer_token(&headers) else {
        return unauthorized("invalid_request");
    };

    let claims = match state.validator.validate_bearer(&token) {
        Ok(claims) => claims,
        Err(_) => return unauthorized("invalid_token"),
    };

    if !claims.has_scope(scopes::OPENID) {
        return (
            StatusCode::FORBIDDEN,
            [(
                header::WWW_AUTHENTICATE,
                "Bearer error=\"insufficient_scope\", scope=\"openid\"",
            )],
        )
            .into_response();
    }

    let user = match state.directory.lookup_user(&claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(sub = %claims.sub, "bearer token for a user the directory no longer knows");
            return unauthorized("invalid_token");
        }
        Err(err) => {
            tracing::error!(error = %err, "directory lookup failed during userinfo");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    let granted: Vec<String> = claims.scopes().iter().map(ToString::to_string).collect();
    let resolved = ClaimsResolver::resolve(&user, &granted);
    Json(UserInfoResponse {
        sub: claims.sub,
        claims: resolved,
    })
    .into_response()
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn unauthorized(code: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            format!("Bearer error=\"{code}\""),
        )],
    )
        .into_response()
}
