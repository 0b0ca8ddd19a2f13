//! oxidc authorization server binary.
//!
//! Wires configuration, signing keys, in-memory stores, and the HTTP
//! collaborators into the protocol router, then serves it.

#![forbid(unsafe_code)]
#![deny(warnings)]

mod config;
mod providers;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use oxidc_protocol::store::{
    InMemoryAuthorizationCodeStore, InMemoryNonceStore, InMemoryRefreshTokenStore,
};
use oxidc_protocol::{
    EndpointConfig, ProviderState, SigningKeyManager, TokenConfig, TokenIssuer, TokenValidator,
};

use crate::config::ServerConfig;
use crate::providers::{load_clients, HttpDirectoryProvider, HttpSessionProvider};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(issuer = %config.issuer, alg = %config.signing_alg, "starting oxidc");

    let keys = Arc::new(SigningKeyManager::new(config.signing_alg)?);
    let issuer = Arc::new(TokenIssuer::new(
        TokenConfig {
            issuer: config.issuer.clone(),
            access_token_lifetime: config.access_token_lifetime,
            id_token_lifetime: config.id_token_lifetime,
        },
        Arc::clone(&keys),
    ));
    let validator = Arc::new(TokenValidator::new(config.issuer.clone(), Arc::clone(&keys)));

    let state = ProviderState {
        clients: Arc::new(load_clients(&config.clients_file)?),
        sessions: Arc::new(HttpSessionProvider::new(&config.session_service_url)?),
        directory: Arc::new(HttpDirectoryProvider::new(&config.directory_service_url)?),
        codes: Arc::new(InMemoryAuthorizationCodeStore::new()),
        refresh_tokens: Arc::new(InMemoryRefreshTokenStore::new()),
        nonces: Arc::new(InMemoryNonceStore::new()),
        keys,
        issuer,
        validator,
        config: EndpointConfig {
            login_url: config.login_url.clone(),
            session_cookie: config.session_cookie.clone(),
            auth_code_lifetime: config.auth_code_lifetime,
            refresh_token_lifetime: config.refresh_token_lifetime,
            nonce_lifetime: config.nonce_lifetime,
        },
    };
    spawn_key_rotation(
        Arc::clone(&state.keys),
        config.key_rotation_interval,
        config.key_grace_period,
    );
    spawn_sweeper(state.clone(), config.sweep_interval);

    let app = oxidc_protocol::router().with_state(state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}

/// Rotates the signing key on a fixed schedule. A failed rotation
/// leaves the current key active, so the server keeps signing.
fn spawn_key_rotation(
    keys: Arc<SigningKeyManager>,
    interval: std::time::Duration,
    grace: chrono::Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(err) = keys.rotate(grace) {
                tracing::error!(error = %err, "scheduled key rotation failed");
            }
        }
    });
}

/// Periodically reaps expired codes, refresh tokens, nonces, and
/// demoted signing keys past their grace period.
fn spawn_sweeper(state: ProviderState, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let mut dropped = state.keys.sweep_expired();
            for (name, result) in [
                ("codes", state.codes.sweep_expired().await),
                ("refresh_tokens", state.refresh_tokens.sweep_expired().await),
                ("nonces", state.nonces.sweep_expired().await),
            ] {
                match result {
                    Ok(count) => dropped += count,
                    Err(err) => tracing::error!(store = name, error = %err, "sweep failed"),
                }
            }
            if dropped > 0 {
                tracing::debug!(dropped, "swept expired artifacts");
            }
        }
    });
}
