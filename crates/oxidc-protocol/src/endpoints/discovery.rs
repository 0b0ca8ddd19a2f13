//! Discovery and JWKS endpoints.

use axum::extract::State;
use axum::Json;

use crate::discovery::{ProviderMetadata, ProviderMetadataBuilder};
use crate::jwks::JsonWebKeySet;

use super::state::ProviderState;

/// Handles `GET /.well-known/openid-configuration`.
pub async fn openid_configuration(State(state): State<ProviderState>) -> Json<ProviderMetadata> {
    Json(ProviderMetadataBuilder::new(state.issuer.issuer()).build())
}

/// Handles `GET /jwks`: every non-expired public signing key.
pub async fn jwks(State(state): State<ProviderState>) -> Json<JsonWebKeySet> {
    Json(state.keys.public_jwks())
}
