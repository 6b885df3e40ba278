mod api;
mod config;
mod engine;
mod error;
mod geo;
mod models;
mod observability;
mod providers;
mod resolve;
mod state;
mod store;
mod tracking;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::providers::{NominatimGeocoder, OrsRouting};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let provider_timeout = Duration::from_millis(config.provider_timeout_ms);
    let routing = Arc::new(OrsRouting::new(
        config.routing_base_url.clone(),
        config.routing_api_key.clone(),
        provider_timeout,
    ));
    let geocoder = Arc::new(NominatimGeocoder::new(
        config.geocoder_base_url.clone(),
        provider_timeout,
    ));

    let (app_state, trigger_rx) = state::AppState::new(&config, routing, geocoder);
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::refresh::run_route_engine(
        shared_state.clone(),
        trigger_rx,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
