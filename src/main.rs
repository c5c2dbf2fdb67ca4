#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;

use anyhow::Result;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::router;
use crate::api::JwtKeys;
use crate::auth::AdminCredentials;
use crate::clicks::Clicks;
use crate::links::Links;
use crate::store::setup;
use crate::store::Store;
use crate::utils::env_var_or_else;

mod api;
mod auth;
mod clicks;
mod client_ip;
mod graceful_shutdown;
mod links;
mod password;
mod resolve;
mod root;
mod store;
#[cfg(test)]
mod tests;
mod utils;

const DEFAULT_RUST_LOG: &str = "trimly=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app();

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown::handler())
    .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
pub fn setup_app() -> Router {
    let store = setup();

    create_router(store)
}

/// Create the router for Trimly
fn create_router<S: Store>(store: S) -> Router {
    let jwt_keys = setup_jwt_keys();
    let credentials = AdminCredentials::from_env();

    let links = Links::new(store.clone());
    let clicks = Clicks::new(store);

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", router::<S>())
        .fallback(get(root::root::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(links))
        .layer(Extension(clicks))
        .layer(Extension(jwt_keys))
        .layer(Extension(credentials))
}

/// Health response
#[derive(Serialize)]
struct Health {
    ok: bool,
}

/// Liveness probe, no dependencies touched
async fn healthz() -> Json<Health> {
    Json(Health { ok: true })
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;
    use tracing_subscriber::EnvFilter;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}

fn setup_jwt_keys() -> JwtKeys {
    use crate::password::generate;

    let jwt_secret = env_var_or_else("JWT_SECRET", || {
        let jwt_secret = generate();
        tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
        jwt_secret
    });

    JwtKeys::new(jwt_secret.as_bytes())
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Ok(port) = std::env::var("PORT") {
        // only check non-empty strings
        if !port.is_empty() {
            let port = port.parse::<u16>()?;

            address.set_port(port);
        }
    }

    Ok(address)
}
