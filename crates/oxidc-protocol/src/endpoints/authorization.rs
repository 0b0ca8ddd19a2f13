//! The authorization endpoint: `GET /authorize`.
//!
//! Validation is two-phased. Until the client and its redirect URI are
//! verified, errors render as a local HTML page and never redirect
//! anywhere (open-redirect defense). After that point, protocol errors
//! are reported to the client via the redirect URI with `error` and
//! `state` parameters, per RFC 6749 §4.1.2.1.
//!
//! Authentication itself lives in the external login service; this
//! handler only asks who is logged in and hands off when nobody is.
//! Every successful path issues an authorization code. Tokens are
//! never returned from this endpoint.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;

use oxidc_model::{AuthenticatedSession, Client};

use crate::error::{OidcError, OidcResult};
use crate::request::AuthorizationRequest;
use crate::store::StoredAuthCode;
use crate::types::{CodeChallengeMethod, ResponseType};

use super::state::ProviderState;

/// Handles `GET /authorize`.
pub async fn authorize(
    State(state): State<ProviderState>,
    headers: HeaderMap,
    Query(request): Query<AuthorizationRequest>,
) -> Response {
    // Phase one: nothing may redirect until the client and redirect
    // URI check out.
    let (client, redirect_uri) = match validate_client_and_redirect(&state, &request).await {
        Ok(pair) => pair,
        Err(err) => return error_page(&err),
    };

    match handle_authorize(&state, &headers, &client, &redirect_uri, &request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(client_id = %client.client_id, error = %err, "authorize request rejected");
            error_redirect(&redirect_uri, &err, request.state.as_deref())
        }
    }
}

async fn validate_client_and_redirect(
    state: &ProviderState,
    request: &AuthorizationRequest,
) -> OidcResult<(Client, String)> {
    let client = state
        .clients
        .get_client(&request.client_id)
        .await?
        .filter(|c| c.enabled && c.oidc_enabled)
        .ok_or_else(|| {
            tracing::warn!(client_id = %request.client_id, "authorize for unknown or disabled client");
            OidcError::InvalidRequest("unknown client".to_string())
        })?;

    let redirect_uri = request
        .redirect_uri
        .clone()
        .ok_or_else(|| OidcError::InvalidRequest("redirect_uri is required".to_string()))?;
    if !client.has_redirect_uri(&redirect_uri) {
        tracing::warn!(client_id = %client.client_id, %redirect_uri, "unregistered redirect_uri");
        return Err(OidcError::InvalidRequest(
            "invalid redirect_uri".to_string(),
        ));
    }
    Ok((client, redirect_uri))
}

async fn handle_authorize(
    state: &ProviderState,
    headers: &HeaderMap,
    client: &Client,
    redirect_uri: &str,
    request: &AuthorizationRequest,
) -> OidcResult<Response> {
    request
        .response_type
        .parse::<ResponseType>()
        .map_err(OidcError::UnsupportedResponseType)?;

    let scopes = request.scopes();
    if scopes.is_empty() {
        return Err(OidcError::InvalidRequest("scope is required".to_string()));
    }
    if !client.allows_scopes(scopes.iter().map(String::as_str)) {
        return Err(OidcError::InvalidScope(
            "scope not allowed for this client".to_string(),
        ));
    }

    let pkce = validate_pkce(client, request)?;

    // Who is logged in? Absent, stale, or forced-fresh sessions hand
    // off to the login service with the original parameters preserved.
    let session = current_session(state, headers).await?;
    let session = match session {
        Some(session) if session_satisfies(&session, request) => session,
        _ => return Ok(login_handoff(state, request)),
    };

    // Point of no return: bind nonce and mint the code.
    if let Some(nonce) = &request.nonce {
        let fresh = state
            .nonces
            .put(nonce, &client.client_id, state.config.nonce_lifetime)
            .await?;
        if !fresh {
            tracing::warn!(client_id = %client.client_id, "nonce replayed across authorize requests");
            return Err(OidcError::InvalidRequest("invalid nonce".to_string()));
        }
    }

    let code = oxidc_crypto::random::generate_authorization_code();
    let mut stored = StoredAuthCode::new(
        &code,
        client.client_id.clone(),
        session.user_id.clone(),
        redirect_uri,
        scopes,
        session.auth_time,
        state.config.auth_code_lifetime,
    );
    if let Some((challenge, method)) = pkce {
        stored = stored.with_pkce(challenge, method);
    }
    if let Some(nonce) = &request.nonce {
        stored = stored.with_nonce(nonce.clone());
    }
    state.codes.put(stored).await?;

    tracing::info!(client_id = %client.client_id, user_id = %session.user_id, "authorization code issued");

    let mut params = vec![("code", code)];
    if let Some(client_state) = &request.state {
        params.push(("state", client_state.clone()));
    }
    Ok(redirect_with_params(redirect_uri, &params))
}

fn validate_pkce(
    client: &Client,
    request: &AuthorizationRequest,
) -> OidcResult<Option<(String, CodeChallengeMethod)>> {
    match &request.code_challenge {
        Some(challenge) => {
            let method = match &request.code_challenge_method {
                Some(raw) => raw
                    .parse::<CodeChallengeMethod>()
                    .map_err(OidcError::InvalidRequest)?,
                None => CodeChallengeMethod::default(),
            };
            if challenge.len() < 43 || challenge.len() > 128 {
                return Err(OidcError::InvalidRequest(
                    "invalid code_challenge".to_string(),
                ));
            }
            Ok(Some((challenge.clone(), method)))
        }
        None if !client.confidential => Err(OidcError::InvalidRequest(
            "public clients must send a code_challenge".to_string(),
        )),
        None => Ok(None),
    }
}

async fn current_session(
    state: &ProviderState,
    headers: &HeaderMap,
) -> OidcResult<Option<AuthenticatedSession>> {
    let Some(token) = cookie_value(headers, &state.config.session_cookie) else {
        return Ok(None);
    };
    Ok(state.sessions.authenticated_session(&token).await?)
}

fn session_satisfies(session: &AuthenticatedSession, request: &AuthorizationRequest) -> bool {
    if request.requires_login() {
        return false;
    }
    if let Some(max_age) = request.max_age {
        if session.is_stale(max_age, Utc::now()) {
            return false;
        }
    }
    true
}

/// Builds the 302 to the login service. The original authorize URL is
/// carried in `return_to`, with any `prompt` directive stripped so the
/// re-entry after login does not loop.
fn login_handoff(state: &ProviderState, request: &AuthorizationRequest) -> Response {
    let mut replay = request.clone();
    replay.prompt = None;
    let query = serde_urlencoded::to_string(&replay).unwrap_or_default();
    let return_to = format!("{}/authorize?{query}", state.issuer.issuer());
    redirect_with_params(&state.config.login_url, &[("return_to", return_to)])
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

fn redirect_with_params(base: &str, params: &[(&str, String)]) -> Response {
    let query = serde_urlencoded::to_string(params).unwrap_or_default();
    let separator = if base.contains('?') { '&' } else { '?' };
    let location = format!("{base}{separator}{query}");
    (
        StatusCode::FOUND,
        [(header::LOCATION, location)],
    )
        .into_response()
}

/// Sends a protocol error back to the client via its redirect URI.
fn error_redirect(redirect_uri: &str, err: &OidcError, client_state: Option<&str>) -> Response {
    let body = err.to_error_response();
    let mut params = vec![("error", body.error)];
    if let Some(description) = body.error_description {
        params.push(("error_description", description));
    }
    if let Some(client_state) = client_state {
        params.push(("state", client_state.to_string()));
    }
    redirect_with_params(redirect_uri, &params)
}

/// Renders a non-redirectable error as a minimal HTML page.
fn error_page(err: &OidcError) -> Response {
    let body = err.to_error_response();
    let description = body.error_description.unwrap_or_default();
    let html = format!(
        "<!DOCTYPE html><html><head><title>Authorization Error</title></head>\
         <body><h1>Authorization Error</h1><p>{}</p><p>{}</p></body></html>",
        html_escape(&body.error),
        html_escape(&description),
    );
    (
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_REQUEST),
        Html(html),
    )
        .into_response()
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
