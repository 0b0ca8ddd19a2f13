//! Client authentication for the token and revocation endpoints.
//!
//! Supports `client_secret_basic` (RFC 6749 §2.3.1, credentials are
//! form-urlencoded inside the Basic header) and `client_secret_post`.
//! Public clients authenticate by identifier alone; their possession
//! proof is PKCE.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use oxidc_model::{Client, ClientProvider};

use crate::error::{OidcError, OidcResult};

/// Credentials extracted from a request, before verification.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    /// The claimed client id.
    pub client_id: String,
    /// The presented secret, if any.
    pub client_secret: Option<String>,
}

/// Pulls client credentials out of the Basic header or the form body.
///
/// The header wins when both are present; supplying conflicting ids in
/// both places is rejected outright.
pub fn extract_client_credentials(
    headers: &HeaderMap,
    form_client_id: Option<&str>,
    form_client_secret: Option<&str>,
) -> OidcResult<ClientCredentials> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| invalid("malformed authorization header"))?;
        let encoded = value
            .strip_prefix("Basic ")
            .ok_or_else(|| invalid("unsupported authorization scheme"))?;
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| invalid("malformed authorization header"))?;
        let decoded =
            String::from_utf8(decoded).map_err(|_| invalid("malformed authorization header"))?;
        let (id, secret) = decoded
            .split_once(':')
            .ok_or_else(|| invalid("malformed authorization header"))?;
        let id = urlencoding::decode(id)
            .map_err(|_| invalid("malformed authorization header"))?
            .into_owned();
        let secret = urlencoding::decode(secret)
            .map_err(|_| invalid("malformed authorization header"))?
            .into_owned();

        if form_client_id.is_some_and(|form_id| form_id != id) {
            return Err(invalid("conflicting client identities"));
        }
        return Ok(ClientCredentials {
            client_id: id,
            client_secret: Some(secret),
        });
    }

    let client_id = form_client_id
        .ok_or_else(|| invalid("client authentication required"))?
        .to_string();
    Ok(ClientCredentials {
        client_id,
        client_secret: form_client_secret.map(ToString::to_string),
    })
}

/// Verifies extracted credentials against the client registry.
///
/// Every failure surfaces the same generic `invalid_client`; the
/// distinguishing detail is logged only.
pub async fn authenticate_client(
    clients: &dyn ClientProvider,
    credentials: &ClientCredentials,
) -> OidcResult<Client> {
    let client = clients
        .get_client(&credentials.client_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(client_id = %credentials.client_id, "unknown client");
            failed()
        })?;

    if !client.enabled {
        tracing::warn!(client_id = %client.client_id, "disabled client attempted authentication");
        return Err(failed());
    }

    if client.confidential {
        let secret = credentials.client_secret.as_deref().ok_or_else(|| {
            tracing::warn!(client_id = %client.client_id, "confidential client sent no secret");
            failed()
        })?;
        if !client.verify_secret(secret) {
            tracing::warn!(client_id = %client.client_id, "client secret mismatch");
            return Err(failed());
        }
    }

    Ok(client)
}

fn invalid(msg: &str) -> OidcError {
    OidcError::InvalidClient(msg.to_string())
}

fn failed() -> OidcError {
    OidcError::InvalidClient("client authentication failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    use oxidc_model::StaticClientProvider;

    fn basic(id: &str, secret: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = STANDARD.encode(format!("{id}:{secret}"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {value}")).unwrap(),
        );
        headers
    }

    #[test]
    fn basic_header_credentials_are_decoded() {
        let creds = extract_client_credentials(&basic("app%3A1", "s%26cret"), None, None).unwrap();
        assert_eq!(creds.client_id, "app:1");
        assert_eq!(creds.client_secret.as_deref(), Some("s&cret"));
    }

    #[test]
    fn form_credentials_are_accepted_without_a_header() {
        let creds =
            extract_client_credentials(&HeaderMap::new(), Some("app1"), Some("secret")).unwrap();
        assert_eq!(creds.client_id, "app1");
        assert_eq!(creds.client_secret.as_deref(), Some("secret"));
    }

    #[test]
    fn conflicting_identities_are_rejected() {
        let err =
            extract_client_credentials(&basic("app1", "x"), Some("app2"), None).unwrap_err();
        assert_eq!(err.error_code(), "invalid_client");
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = extract_client_credentials(&HeaderMap::new(), None, None).unwrap_err();
        assert_eq!(err.error_code(), "invalid_client");
    }

    #[tokio::test]
    async fn authenticates_confidential_clients() {
        let provider = StaticClientProvider::new(vec![Client::new_confidential("svc", "s3cret")]);
        let good = ClientCredentials {
            client_id: "svc".into(),
            client_secret: Some("s3cret".into()),
        };
        assert!(authenticate_client(&provider, &good).await.is_ok());

        let bad = ClientCredentials {
            client_id: "svc".into(),
            client_secret: Some("wrong".into()),
        };
        let err = authenticate_client(&provider, &bad).await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_client");

        let missing = ClientCredentials {
            client_id: "svc".into(),
            client_secret: None,
        };
        assert!(authenticate_client(&provider, &missing).await.is_err());
    }

    #[tokio::test]
    async fn public_clients_authenticate_by_id() {
        let provider = StaticClientProvider::new(vec![Client::new_public("spa")]);
        let creds = ClientCredentials {
            client_id: "spa".into(),
            client_secret: None,
        };
        let client = authenticate_client(&provider, &creds).await.unwrap();
        assert!(!client.confidential);
    }

    #[tokio::test]
    async fn disabled_and_unknown_clients_look_identical() {
        let mut disabled = Client::new_public("off");
        disabled.enabled = false;
        let provider = StaticClientProvider::new(vec![disabled]);

        let err = authenticate_client(
            &provider,
            &ClientCredentials {
                client_id: "off".into(),
                client_secret: None,
            },
        )
        .await
        .unwrap_err();
        let unknown = authenticate_client(
            &provider,
            &ClientCredentials {
                client_id: "ghost".into(),
                client_secret: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_error_response().error_description, unknown.to_error_response().error_description);
    }
}
