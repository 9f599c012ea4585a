//! Resumable chunked upload service — main entry point.
//!
//! Handles configuration loading, logging initialization, composition-root
//! bootstrap, Axum router assembly, and graceful shutdown.

mod app_state;
mod bootstrap;
mod config;
mod error;
mod handlers;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app_state::AppState;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    config.validate()?;

    initialize_logging(&config)?;

    info!("starting upload service api");
    info!(address = %config.server_address(), "configuration loaded");

    let app_state = bootstrap::bootstrap(&config).await.map_err(|e| {
        eprintln!("bootstrap failed: {e}");
        std::process::exit(1);
    })?;

    let app = build_router(app_state, &config);

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "upload service api is ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("upload service api shut down gracefully");
    Ok(())
}

fn initialize_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("upload_service_api={},upload_core={}", config.logging.level, config.logging.level)));

    match config.logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn build_router(app_state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health::health_check))
        .route("/uploads/init", post(handlers::upload::init))
        .route("/uploads/{id}/chunks", post(handlers::upload::put_chunk))
        .route("/uploads/{id}/finalize", post(handlers::upload::finalize))
        .route("/uploads/{id}/abort", post(handlers::upload::abort))
        .route("/uploads/{id}", get(handlers::upload::status))
        .with_state(app_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(CorsLayer::permissive())
        // Axum's own default (2 MiB) is below this service's default chunk size (spec §4.5);
        // bound chunk bodies by the configured max instead.
        .layer(DefaultBodyLimit::max(config.upload_policy.max_chunk_size as usize))
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("received ctrl+c signal"),
        _ = terminate => warn!("received sigterm signal"),
    }

    info!("starting graceful shutdown...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}
