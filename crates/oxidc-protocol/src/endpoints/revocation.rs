//! The revocation endpoint: `POST /revoke` (RFC 7009).
//!
//! Responds 200 whether or not the token existed, so the endpoint
//! cannot be used to probe for live tokens. Revoking a refresh token
//! takes its whole rotation lineage with it. Access tokens are
//! stateless JWTs; revoking one is accepted and logged but has no
//! server-side effect.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;

use crate::error::{OidcError, OidcResult};
use crate::request::RevocationRequest;
use crate::store::hash_token;

use super::client_auth::{authenticate_client, extract_client_credentials};
use super::state::ProviderState;
use super::token::error_response;

/// Handles `POST /revoke`.
pub async fn revoke(
    State(state): State<ProviderState>,
    headers: HeaderMap,
    Form(request): Form<RevocationRequest>,
) -> Response {
    match handle_revocation(&state, &headers, &request).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(&err),
    }
}

async fn handle_revocation(
    state: &ProviderState,
    headers: &HeaderMap,
    request: &RevocationRequest,
) -> OidcResult<()> {
    let credentials = extract_client_credentials(
        headers,
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
    )?;
    let client = authenticate_client(state.clients.as_ref(), &credentials).await?;

    let Some(record) = state.refresh_tokens.find(&hash_token(&request.token)).await? else {
        // Unknown token: possibly an access token, possibly garbage.
        // Either way RFC 7009 says accept silently.
        tracing::debug!(
            client_id = %client.client_id,
            hint = request.token_type_hint.as_deref().unwrap_or("none"),
            "revocation of unknown token accepted"
        );
        return Ok(());
    };

    // A client may only revoke its own tokens.
    if record.client_id != client.client_id {
        tracing::warn!(
            owner = %record.client_id,
            caller = %client.client_id,
            "client attempted to revoke a token it does not own"
        );
        return Err(OidcError::UnauthorizedClient(
            "token was not issued to this client".to_string(),
        ));
    }

    let revoked = state.refresh_tokens.revoke_lineage(record.id).await?;
    tracing::info!(
        client_id = %client.client_id,
        lineage_revoked = revoked,
        "refresh token revoked"
    );
    Ok(())
}
