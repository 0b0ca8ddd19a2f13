//! Route table for the provider.

use axum::routing::{get, post};
use axum::Router;

use super::authorization::authorize;
use super::discovery::{jwks, openid_configuration};
use super::revocation::revoke;
use super::state::ProviderState;
use super::token::token;
use super::userinfo::userinfo;

/// Builds the provider router. The caller supplies a [`ProviderState`]
/// via [`Router::with_state`].
pub fn router() -> Router<ProviderState> {
    Router::new()
        .route("/.well-known/openid-configuration", get(openid_configuration))
        .route("/authorize", get(authorize))
        .route("/token", post(token))
        .route("/userinfo", get(userinfo).post(userinfo))
        .route("/revoke", post(revoke))
        .route("/jwks", get(jwks))
}
