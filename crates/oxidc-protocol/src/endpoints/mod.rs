//! HTTP surface of the provider: axum handlers, client authentication
//! and the route table.

pub mod authorization;
pub mod client_auth;
pub mod discovery;
pub mod revocation;
pub mod router;
pub mod state;
pub mod token;
pub mod userinfo;

pub use client_auth::{authenticate_client, extract_client_credentials, ClientCredentials};
pub use router::router;
pub use state::{EndpointConfig, ProviderState};
pub use userinfo::UserInfoResponse;
