//! # oxidc-crypto
//!
//! Cryptographic primitives for the oxidc authorization server:
//!
//! - [`algorithm`] - Supported JWS signature algorithms
//! - [`hash`] - SHA-2 digests and base64url digest helpers
//! - [`keys`] - RSA key pair generation and key ID derivation
//! - [`random`] - CSPRNG-backed codes, tokens, and identifiers
//!
//! Private key material never leaves this crate in any form other than
//! PKCS#8 PEM handed to the signing-key registry.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod hash;
pub mod keys;
pub mod random;

pub use algorithm::SignatureAlgorithm;
pub use keys::{CryptoError, RsaKeyMaterial};
