//! Authenticated end-user sessions from the external login service.
//!
//! The login service owns authentication entirely (credentials, MFA,
//! consent UI). The authorization endpoint only ever asks "who is
//! authenticated behind this session token, and since when" and hands
//! off to the login service when the answer is nobody.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// An authenticated end-user session as reported by the login service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    /// The authenticated user's directory id.
    pub user_id: String,
    /// When the user last actively authenticated.
    pub auth_time: DateTime<Utc>,
}

impl AuthenticatedSession {
    /// Whether the authentication is older than `max_age` seconds.
    #[must_use]
    pub fn is_stale(&self, max_age: i64, now: DateTime<Utc>) -> bool {
        (now - self.auth_time).num_seconds() > max_age
    }
}

/// Read-only session lookup against the login service.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolves a browser session token to an authenticated session.
    /// `None` when the token is unknown, expired, or logged out.
    async fn authenticated_session(
        &self,
        session_token: &str,
    ) -> Result<Option<AuthenticatedSession>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn staleness_respects_max_age() {
        let now = Utc::now();
        let session = AuthenticatedSession {
            user_id: "u1".into(),
            auth_time: now - Duration::seconds(600),
        };
        assert!(session.is_stale(300, now));
        assert!(!session.is_stale(900, now));
    }
}
