//! Shared state for the protocol endpoints.

use std::sync::Arc;

use chrono::Duration;

use oxidc_model::{ClientProvider, DirectoryProvider, SessionProvider};

use crate::keyring::SigningKeyManager;
use crate::store::{AuthorizationCodeStore, NonceStore, RefreshTokenStore};
use crate::token::{TokenIssuer, TokenValidator};

/// Endpoint-level configuration.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// URL of the external login service; unauthenticated authorize
    /// requests are handed off here.
    pub login_url: String,
    /// Cookie carrying the browser session token.
    pub session_cookie: String,
    /// TTL for issued authorization codes.
    pub auth_code_lifetime: Duration,
    /// TTL for issued refresh tokens.
    pub refresh_token_lifetime: Duration,
    /// TTL for registered nonces.
    pub nonce_lifetime: Duration,
}

/// Everything the endpoint handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct ProviderState {
    /// Client registry collaborator.
    pub clients: Arc<dyn ClientProvider>,
    /// Login-service collaborator.
    pub sessions: Arc<dyn SessionProvider>,
    /// Directory-service collaborator.
    pub directory: Arc<dyn DirectoryProvider>,
    /// Authorization code store.
    pub codes: Arc<dyn AuthorizationCodeStore>,
    /// Refresh token store.
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    /// Nonce store.
    pub nonces: Arc<dyn NonceStore>,
    /// Signing keys; owns all private key material.
    pub keys: Arc<SigningKeyManager>,
    /// Token issuance.
    pub issuer: Arc<TokenIssuer>,
    /// Bearer token validation.
    pub validator: Arc<TokenValidator>,
    /// Static endpoint configuration.
    pub config: EndpointConfig,
}
