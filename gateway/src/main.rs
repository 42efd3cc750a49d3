use anyhow::Context;
use gateway::clients::{SensorsClient, StateMonitoringClient, TemperatureClient};
use gateway::config::Config;
use gateway::db::{self, PgSensorStore};
use gateway::metrics;
use gateway::rest;
use gateway::service::{Backends, Gateway};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    info!("Starting smart-home gateway");
    info!("HTTP server: {}", config.server_address);
    info!("Database: {}", config.redacted_database_url());
    info!("Sensors API: {}", config.sensors_api_url);
    info!("State monitoring API: {}", config.statemon_api_url);
    info!("Temperature API: {}", config.temperature_api_url);
    info!("Backend request timeout: {:?}", config.request_timeout);

    metrics::init_metrics().context("failed to register metrics")?;

    let pool = db::make_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let store = Arc::new(PgSensorStore::new(pool));

    let sensors_api = Arc::new(SensorsClient::new(
        config.sensors_api_url.clone(),
        config.request_timeout,
    )?);
    let state_monitoring = Arc::new(StateMonitoringClient::new(
        config.statemon_api_url.clone(),
        config.request_timeout,
    )?);
    let temperature = Arc::new(TemperatureClient::new(
        config.temperature_api_url.clone(),
        config.request_timeout,
    )?);

    let backends = Backends {
        store: store.clone(),
        store_data: store,
        sensors_api: sensors_api.clone(),
        sensors_api_location: sensors_api,
        state_monitoring,
        temperature_location: temperature.clone(),
        temperature_live: temperature,
    };
    let app = rest::create_router(Gateway::new(config.routes.clone(), backends));

    let listener = tokio::net::TcpListener::bind(config.server_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.server_address))?;

    info!("HTTP server listening on {}", config.server_address);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
    Ok(())
}
