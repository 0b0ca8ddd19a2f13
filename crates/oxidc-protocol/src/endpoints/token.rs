//! The token endpoint: `POST /token`.

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};

use crate::error::{OidcError, OidcResult};
use crate::grants::{
    AuthorizationCodeGrant, ClientCredentialsGrant, GrantContext, RefreshTokenGrant,
};
use crate::request::TokenRequest;
use crate::token::TokenResponse;
use crate::types::GrantType;

use super::client_auth::{authenticate_client, extract_client_credentials};
use super::state::ProviderState;

/// Handles `POST /token` (form-encoded).
///
/// The body is extracted fallibly so that malformed or non-form
/// payloads still produce the RFC 6749 §5.2 JSON error object instead
/// of a bare rejection.
pub async fn token(
    State(state): State<ProviderState>,
    headers: HeaderMap,
    request: Result<Form<TokenRequest>, FormRejection>,
) -> Response {
    let Form(request) = match request {
        Ok(form) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "token request body rejected");
            return error_response(&OidcError::InvalidRequest(
                "request body must be application/x-www-form-urlencoded".to_string(),
            ));
        }
    };
    match handle_token_request(&state, &headers, &request).await {
        Ok(response) => (
            StatusCode::OK,
            [
                (header::CACHE_CONTROL, "no-store"),
                (header::PRAGMA, "no-cache"),
            ],
            Json(response),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

async fn handle_token_request(
    state: &ProviderState,
    headers: &HeaderMap,
    request: &TokenRequest,
) -> OidcResult<TokenResponse> {
    let grant_type: GrantType = request
        .grant_type
        .parse()
        .map_err(OidcError::UnsupportedGrantType)?;

    let credentials = extract_client_credentials(
        headers,
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
    )?;
    let client = authenticate_client(state.clients.as_ref(), &credentials).await?;

    let ctx = GrantContext {
        issuer: &state.issuer,
        codes: state.codes.as_ref(),
        refresh_tokens: state.refresh_tokens.as_ref(),
        nonces: state.nonces.as_ref(),
        directory: state.directory.as_ref(),
        refresh_token_lifetime: state.config.refresh_token_lifetime,
    };

    match grant_type {
        GrantType::AuthorizationCode => {
            AuthorizationCodeGrant::handle(
                &ctx,
                &client,
                request.code.as_deref(),
                request.redirect_uri.as_deref(),
                request.code_verifier.as_deref(),
            )
            .await
        }
        GrantType::RefreshToken => {
            RefreshTokenGrant::handle(
                &ctx,
                &client,
                request.refresh_token.as_deref(),
                request.scope.as_deref(),
            )
            .await
        }
        GrantType::ClientCredentials => {
            ClientCredentialsGrant::handle(&ctx, &client, request.scope.as_deref()).await
        }
    }
}

/// Serializes a protocol error as the RFC 6749 JSON error object with
/// its mapped status. Client-authentication failures additionally get
/// a `WWW-Authenticate` challenge, per RFC 6749 §5.2.
pub(crate) fn error_response(err: &OidcError) -> Response {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    let body = Json(err.to_error_response());
    if matches!(err, OidcError::InvalidClient(_)) {
        (
            status,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"oxidc\"")],
            body,
        )
            .into_response()
    } else {
        (status, body).into_response()
    }
}
