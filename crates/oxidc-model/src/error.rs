//! Errors surfaced by external-collaborator providers.

use thiserror::Error;

/// Failure while consulting an external collaborator (client registry,
/// session service, directory service).
///
/// Messages are operator-facing; the protocol layer translates these
/// into generic wire errors before anything reaches a client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The collaborator could not be reached or timed out.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator answered with data the core cannot use.
    #[error("collaborator returned invalid data: {0}")]
    Data(String),
}
