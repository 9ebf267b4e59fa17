//! Racers API server entry point.

use std::sync::Arc;

use racers_api::app;
use racers_api::config::Config;
use racers_api::error::AppError;
use racers_api::metrics::HttpMetrics;
use racers_api::state::AppState;
use racers_api::telemetry;
use racers_core::clock::{Clock, SystemClock};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let provider = telemetry::init_tracing(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting racers API server");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let app_state = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = racers_store::connect(database_url, config.max_connections).await?;
            if config.run_migrations {
                racers_store::migrate(&pool).await?;
            }
            AppState::postgres(&pool, clock)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            AppState::in_memory(clock)
        }
    };

    let metrics = Arc::new(HttpMetrics::new()?);
    let app = app::router(app_state, metrics, config.request_timeout);

    let addr = config.socket_addr()?;
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(provider) = provider {
        provider
            .shutdown()
            .map_err(|err| AppError::Telemetry(err.to_string()))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
