//! # oxidc-model
//!
//! Domain model for the oxidc authorization server and the narrow
//! read-only interfaces to its external collaborators:
//!
//! - [`client`] - Registered OAuth clients and the [`ClientProvider`] lookup trait
//! - [`directory`] - User attributes sourced from the directory service
//! - [`session`] - Authenticated end-user sessions from the login service
//!
//! The core never writes to a collaborator; all three traits are
//! read-only by construction.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod client;
pub mod directory;
pub mod error;
pub mod session;

pub use client::{Client, ClientProvider, StaticClientProvider};
pub use directory::{DirectoryAddress, DirectoryProvider, DirectoryUser};
pub use error::ProviderError;
pub use session::{AuthenticatedSession, SessionProvider};
