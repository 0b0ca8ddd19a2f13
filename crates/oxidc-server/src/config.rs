//! Environment-driven server configuration.
//!
//! Everything is read once at startup from `OXIDC_*` variables, with a
//! `.env` file honored in development via `dotenvy`.

use anyhow::{Context, Result};
use chrono::Duration;

use oxidc_crypto::SignatureAlgorithm;

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Public issuer URL; ends up in `iss` and the discovery document.
    pub issuer: String,
    /// Signing algorithm for all issued tokens.
    pub signing_alg: SignatureAlgorithm,
    /// Access token lifetime.
    pub access_token_lifetime: Duration,
    /// ID token lifetime.
    pub id_token_lifetime: Duration,
    /// Authorization code lifetime.
    pub auth_code_lifetime: Duration,
    /// Refresh token lifetime.
    pub refresh_token_lifetime: Duration,
    /// Nonce registration lifetime.
    pub nonce_lifetime: Duration,
    /// Verification grace period for demoted signing keys.
    pub key_grace_period: Duration,
    /// Interval between automatic signing-key rotations.
    pub key_rotation_interval: std::time::Duration,
    /// Interval between expired-artifact sweeps.
    pub sweep_interval: std::time::Duration,
    /// Base URL of the login/session service.
    pub session_service_url: String,
    /// Base URL of the directory service.
    pub directory_service_url: String,
    /// Login page URL for the authorize handoff.
    pub login_url: String,
    /// Name of the browser session cookie.
    pub session_cookie: String,
    /// Path to the JSON client registry file.
    pub clients_file: String,
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        // Missing .env is fine; real deployments set the environment.
        dotenvy::dotenv().ok();

        let host = env_or("OXIDC_HOST", "0.0.0.0");
        let port =
            u16::try_from(parsed("OXIDC_PORT", 8080)?).context("OXIDC_PORT out of range")?;
        let issuer = required("OXIDC_ISSUER")?;
        let signing_alg = env_or("OXIDC_SIGNING_ALG", "RS256")
            .parse::<SignatureAlgorithm>()
            .map_err(|e| anyhow::anyhow!(e))?;

        Ok(Self {
            host,
            port,
            issuer,
            signing_alg,
            access_token_lifetime: Duration::seconds(parsed("OXIDC_ACCESS_TOKEN_LIFESPAN", 3600)?),
            id_token_lifetime: Duration::seconds(parsed("OXIDC_ID_TOKEN_LIFESPAN", 300)?),
            auth_code_lifetime: Duration::seconds(parsed("OXIDC_AUTH_CODE_LIFESPAN", 120)?),
            refresh_token_lifetime: Duration::seconds(parsed(
                "OXIDC_REFRESH_TOKEN_LIFESPAN",
                2_592_000,
            )?),
            nonce_lifetime: Duration::seconds(parsed("OXIDC_NONCE_LIFESPAN", 300)?),
            key_grace_period: Duration::seconds(parsed("OXIDC_KEY_GRACE_PERIOD", 604_800)?),
            key_rotation_interval: std::time::Duration::from_secs(
                u64::try_from(parsed("OXIDC_KEY_ROTATION_INTERVAL", 86_400)?)
                    .context("OXIDC_KEY_ROTATION_INTERVAL must be positive")?,
            ),
            sweep_interval: std::time::Duration::from_secs(
                u64::try_from(parsed("OXIDC_SWEEP_INTERVAL", 60)?)
                    .context("OXIDC_SWEEP_INTERVAL must be positive")?,
            ),
            session_service_url: required("OXIDC_SESSION_SERVICE_URL")?,
            directory_service_url: required("OXIDC_DIRECTORY_SERVICE_URL")?,
            login_url: required("OXIDC_LOGIN_URL")?,
            session_cookie: env_or("OXIDC_SESSION_COOKIE", "oxidc_session"),
            clients_file: required("OXIDC_CLIENTS_FILE")?,
        })
    }

    /// The socket address to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed(key: &str, default: i64) -> Result<i64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<i64>()
            .with_context(|| format!("{key} must be an integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
