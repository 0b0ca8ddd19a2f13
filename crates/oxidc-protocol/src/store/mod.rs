//! Single-use artifact stores: authorization codes, refresh tokens,
//! and nonces.
//!
//! Every store hashes its key material before persisting it and offers
//! an atomic check-and-mark `consume`; under concurrent redemption of
//! the same artifact exactly one caller wins and all others observe a
//! hard failure. Expired entries are reaped by `sweep_expired`, driven
//! by a background task.

mod code;
mod nonce;
mod refresh;

pub use code::{
    hash_code, AuthorizationCodeStore, InMemoryAuthorizationCodeStore, StoredAuthCode,
};
pub use nonce::{hash_nonce, InMemoryNonceStore, NonceStore};
pub use refresh::{
    hash_token, InMemoryRefreshTokenStore, RefreshConsume, RefreshTokenRecord, RefreshTokenStore,
};
