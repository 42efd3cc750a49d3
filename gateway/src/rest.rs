use crate::errors::Error;
use crate::metrics;
use crate::model::{
    ErrorResponse, MessageResponse, Sensor, SensorCreate, SensorData, SensorUpdate,
    TemperaturePayload,
};
use crate::service::Gateway;
use crate::validate::parse_sensor_id;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

#[derive(Clone)]
struct AppState {
    gateway: Arc<Gateway>,
}

pub fn create_router(gateway: Gateway) -> Router {
    let state = AppState {
        gateway: Arc::new(gateway),
    };

    let sensors = Router::new()
        .route("/sensors", get(get_sensors).post(create_sensor))
        .route(
            "/sensors/:id",
            get(get_sensor).put(update_sensor).delete(delete_sensor),
        )
        .route(
            "/sensors/:id/value",
            get(get_sensor_value).patch(update_sensor_value),
        )
        .route("/sensors/temperature", get(missing_location))
        .route("/sensors/temperature/", get(missing_location))
        .route("/sensors/temperature/:location", get(get_temperature_by_location));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .merge(sensors.clone())
        .nest("/api/v1", sensors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics_handler() -> Result<String, AppError> {
    Ok(metrics::gather_metrics()?)
}

async fn get_sensors(State(state): State<AppState>) -> Result<Json<Vec<Sensor>>, AppError> {
    Ok(Json(state.gateway.list_sensors().await?))
}

async fn get_sensor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sensor>, AppError> {
    let id = parse_sensor_id(&id)?;
    Ok(Json(state.gateway.get_sensor(id).await?))
}

async fn create_sensor(
    State(state): State<AppState>,
    body: Result<Json<SensorCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Sensor>), AppError> {
    let Json(sensor) = body?;
    let created = state.gateway.create_sensor(sensor).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_sensor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SensorUpdate>, JsonRejection>,
) -> Result<Json<Sensor>, AppError> {
    let id = parse_sensor_id(&id)?;
    let Json(update) = body?;
    Ok(Json(state.gateway.update_sensor(id, update).await?))
}

async fn delete_sensor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_sensor_id(&id)?;
    state.gateway.delete_sensor(id).await?;
    Ok(Json(MessageResponse::new("Sensor deleted successfully")))
}

async fn get_sensor_value(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SensorData>, AppError> {
    let id = parse_sensor_id(&id)?;
    Ok(Json(state.gateway.get_sensor_data(id).await?))
}

async fn update_sensor_value(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SensorData>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_sensor_id(&id)?;
    let Json(data) = body?;
    state.gateway.update_sensor_value(id, data).await?;
    Ok(Json(MessageResponse::new("Sensor value updated successfully")))
}

async fn get_temperature_by_location(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<TemperaturePayload>, AppError> {
    let reading = state.gateway.temperature_by_location(&location).await?;
    Ok(Json(reading.into()))
}

async fn missing_location() -> AppError {
    AppError(Error::Validation("Location is required".to_string()))
}

/// Maps gateway errors onto the `{error, status_code}` contract.
pub struct AppError(Error);

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0 {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Error::Api { status, message } => (
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message.clone(),
            ),
            Error::Transport { source, .. } if source.is_timeout() => (
                StatusCode::GATEWAY_TIMEOUT,
                "Backend service timed out".to_string(),
            ),
            Error::Transport { .. } => (
                StatusCode::BAD_GATEWAY,
                "Backend service unavailable".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(kind = self.0.kind(), "API error: {}", self.0);
        } else {
            debug!(kind = self.0.kind(), "API client error: {}", self.0);
        }

        let body = ErrorResponse {
            error: message,
            status_code: Some(status.as_u16()),
        };
        (status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::Validation(rejection.body_text()))
    }
}
