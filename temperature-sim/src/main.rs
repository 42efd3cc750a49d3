mod reading;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use clap::Parser;
use reading::{generate_reading, Reading, TemperatureRange};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Mock temperature API serving random readings.
#[derive(Debug, Parser)]
#[command(name = "temperature-sim")]
struct Args {
    /// Listen address
    #[arg(long, env = "TEMP_SIM_ADDR", default_value = "0.0.0.0:5000")]
    addr: SocketAddr,

    /// Lowest generated temperature
    #[arg(long, env = "MIN_TEMP", default_value_t = -20.0, allow_hyphen_values = true)]
    min_temp: f64,

    /// Highest generated temperature
    #[arg(long, env = "MAX_TEMP", default_value_t = 40.0, allow_hyphen_values = true)]
    max_temp: f64,
}

#[derive(Clone)]
struct AppState {
    range: TemperatureRange,
}

#[derive(Debug, Default, Deserialize)]
struct ReadingQuery {
    location: Option<String>,
    sensor_id: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let range = match TemperatureRange::new(args.min_temp, args.max_temp) {
        Ok(range) => range,
        Err(e) => {
            error!("Invalid temperature range: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting temperature simulator");
    info!("Range: {} .. {} celsius", args.min_temp, args.max_temp);

    let listener = match tokio::net::TcpListener::bind(args.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", args.addr, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", args.addr);

    if let Err(e) = axum::serve(listener, app(AppState { range })).await {
        error!("HTTP server error: {}", e);
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/temperature", get(temperature))
        .route("/temperature/:sensor_id", get(temperature_by_id))
        .route("/health", get(health))
        .with_state(state)
}

async fn temperature(
    State(state): State<AppState>,
    Query(query): Query<ReadingQuery>,
) -> Json<Reading> {
    Json(reading(
        &state,
        query.location.as_deref(),
        query.sensor_id.as_deref(),
    ))
}

async fn temperature_by_id(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Json<Reading> {
    Json(reading(&state, None, Some(&sensor_id)))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn reading(state: &AppState, location: Option<&str>, sensor_id: Option<&str>) -> Reading {
    let reading = generate_reading(&mut rand::thread_rng(), &state.range, location, sensor_id);
    debug!(
        "Generated {} for sensor {} at {}",
        reading.value, reading.sensor_id, reading.location
    );
    reading
}
