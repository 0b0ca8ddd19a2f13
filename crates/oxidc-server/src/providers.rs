//! Concrete collaborator providers: HTTP-backed session and directory
//! lookups, and the file-backed client registry.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use oxidc_model::{
    AuthenticatedSession, Client, DirectoryProvider, DirectoryUser, ProviderError,
    SessionProvider, StaticClientProvider,
};

const COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(5);

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(COLLABORATOR_TIMEOUT)
        .build()
        .context("building collaborator HTTP client")
}

/// Session lookup against the login service's REST interface.
pub struct HttpSessionProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionProvider {
    /// Creates a provider for the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn authenticated_session(
        &self,
        session_token: &str,
    ) -> Result<Option<AuthenticatedSession>, ProviderError> {
        let url = format!("{}/sessions/{session_token}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("session service: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<AuthenticatedSession>()
                .await
                .map(Some)
                .map_err(|e| ProviderError::Data(format!("session service: {e}"))),
            status => Err(ProviderError::Unavailable(format!(
                "session service answered {status}"
            ))),
        }
    }
}

/// User lookup against the directory service's REST interface.
pub struct HttpDirectoryProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryProvider {
    /// Creates a provider for the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DirectoryProvider for HttpDirectoryProvider {
    async fn lookup_user(&self, user_id: &str) -> Result<Option<DirectoryUser>, ProviderError> {
        let url = format!("{}/users/{user_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("directory service: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<DirectoryUser>()
                .await
                .map(Some)
                .map_err(|e| ProviderError::Data(format!("directory service: {e}"))),
            status => Err(ProviderError::Unavailable(format!(
                "directory service answered {status}"
            ))),
        }
    }
}

/// Operator-facing client registration, as written in the clients file.
/// Secrets appear in plaintext here and are hashed on load.
#[derive(Debug, Deserialize)]
struct ClientRegistration {
    client_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_true")]
    oidc_enabled: bool,
    /// Present for confidential clients, absent for public ones.
    #[serde(default)]
    secret: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
    #[serde(default)]
    allowed_scopes: Vec<String>,
}

const fn default_true() -> bool {
    true
}

impl ClientRegistration {
    fn into_client(self) -> Client {
        let mut client = match &self.secret {
            Some(secret) => Client::new_confidential(self.client_id, secret),
            None => Client::new_public(self.client_id),
        };
        if let Some(name) = self.name {
            client = client.with_name(name);
        }
        client.enabled = self.enabled;
        client.oidc_enabled = self.oidc_enabled;
        for uri in self.redirect_uris {
            client = client.with_redirect_uri(uri);
        }
        for scope in self.allowed_scopes {
            client = client.with_scope(scope);
        }
        client
    }
}

/// Loads the client registry from a JSON file.
pub fn load_clients(path: &str) -> Result<StaticClientProvider> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading clients file {path}"))?;
    let registrations: Vec<ClientRegistration> =
        serde_json::from_str(&raw).with_context(|| format!("parsing clients file {path}"))?;
    let provider = StaticClientProvider::new(
        registrations
            .into_iter()
            .map(ClientRegistration::into_client)
            .collect(),
    );
    tracing::info!(clients = provider.len(), %path, "client registry loaded");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrations_map_onto_clients() {
        let raw = r#"[
            {
                "client_id": "web",
                "name": "Web App",
                "secret": "hunter2",
                "redirect_uris": ["https://web.example/cb"],
                "allowed_scopes": ["openid", "email"]
            },
            {
                "client_id": "spa",
                "enabled": false,
                "redirect_uris": ["https://spa.example/cb"],
                "allowed_scopes": ["openid"]
            }
        ]"#;
        let registrations: Vec<ClientRegistration> = serde_json::from_str(raw).unwrap();
        let clients: Vec<Client> = registrations
            .into_iter()
            .map(ClientRegistration::into_client)
            .collect();

        assert!(clients[0].confidential);
        assert!(clients[0].verify_secret("hunter2"));
        assert!(clients[0].has_redirect_uri("https://web.example/cb"));
        assert!(clients[0].allows_scopes(["openid", "email"]));

        assert!(!clients[1].confidential);
        assert!(!clients[1].enabled);
        assert!(clients[1].secret_hash.is_none());
    }
}
