//! OAuth 2.0 / OpenID Connect provider core.
//!
//! This crate implements the protocol machinery of the provider: the
//! authorization code flow with PKCE, refresh token rotation with
//! reuse detection, client credentials, RS256/RS384/RS512 token
//! signing with rotating keys, userinfo claim resolution, discovery
//! metadata and RFC 7009 revocation. Users, browser sessions and
//! client registration live behind the [`oxidc_model`] collaborator
//! traits; everything here is storage and transport agnostic apart
//! from the axum handlers in [`endpoints`].

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod claims;
pub mod discovery;
pub mod endpoints;
pub mod error;
pub mod grants;
pub mod jwks;
pub mod keyring;
pub mod pkce;
pub mod request;
pub mod resolver;
pub mod store;
pub mod token;
pub mod types;

pub use claims::{AccessTokenClaims, Audience, IdTokenClaims};
pub use discovery::{ProviderMetadata, ProviderMetadataBuilder};
pub use endpoints::{router, EndpointConfig, ProviderState};
pub use error::{ErrorResponse, OidcError, OidcResult};
pub use jwks::{JsonWebKey, JsonWebKeySet};
pub use keyring::SigningKeyManager;
pub use token::{TokenConfig, TokenIssuer, TokenResponse, TokenValidator};
pub use types::{CodeChallengeMethod, GrantType, ResponseType};
