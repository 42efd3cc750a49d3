use crate::backend::{SensorBackend, SensorDataBackend};
use crate::errors::{Error, Result};
use crate::model::{
    Sensor, SensorCreate, SensorData, SensorUpdate, SensorValue, ValueKind, ValueUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

const SENSOR_COLUMNS: &str =
    "id, name, type, location, value, unit, status, last_updated, created_at";

pub async fn make_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    info!("Database connection established");
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed");

    Ok(pool)
}

#[derive(Debug, sqlx::FromRow)]
struct SensorRow {
    id: i32,
    name: String,
    #[sqlx(rename = "type")]
    sensor_type: String,
    location: String,
    value: Option<f64>,
    unit: Option<String>,
    status: Option<String>,
    last_updated: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<SensorRow> for Sensor {
    fn from(row: SensorRow) -> Self {
        Sensor {
            id: row.id,
            name: row.name,
            sensor_type: row.sensor_type.into(),
            location: row.location,
            value: row.value,
            unit: row.unit,
            status: row.status,
            last_updated: row.last_updated.to_rfc3339(),
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

fn not_found(id: i32) -> Error {
    Error::NotFound(format!("Sensor {} not found", id))
}

/// Sensors stored in the gateway's own PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PgSensorStore {
    pool: PgPool,
}

impl PgSensorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i32) -> Result<Sensor> {
        let query = format!("SELECT {} FROM sensors WHERE id = $1", SENSOR_COLUMNS);
        sqlx::query_as::<_, SensorRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Sensor::from)
            .ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl SensorBackend for PgSensorStore {
    async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        let query = format!("SELECT {} FROM sensors ORDER BY id", SENSOR_COLUMNS);
        let rows = sqlx::query_as::<_, SensorRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        debug!("Loaded {} sensors from database", rows.len());
        Ok(rows.into_iter().map(Sensor::from).collect())
    }

    async fn get_sensor(&self, id: i32) -> Result<Sensor> {
        self.fetch(id).await
    }

    async fn create_sensor(&self, sensor: &SensorCreate) -> Result<Sensor> {
        let query = format!(
            "INSERT INTO sensors (name, type, location, unit, last_updated, created_at)
             VALUES ($1, $2, $3, $4, NOW(), NOW())
             RETURNING {}",
            SENSOR_COLUMNS
        );
        let row = sqlx::query_as::<_, SensorRow>(&query)
            .bind(&sensor.name)
            .bind(sensor.sensor_type.as_str())
            .bind(&sensor.location)
            .bind(&sensor.unit)
            .fetch_one(&self.pool)
            .await?;
        info!("Created sensor {} ({})", row.id, row.name);
        Ok(row.into())
    }

    async fn update_sensor(&self, id: i32, update: &SensorUpdate) -> Result<Sensor> {
        let query = format!(
            "UPDATE sensors SET
                name = COALESCE($2, name),
                type = COALESCE($3, type),
                location = COALESCE($4, location),
                value = COALESCE($5, value),
                unit = COALESCE($6, unit),
                status = COALESCE($7, status),
                last_updated = NOW()
             WHERE id = $1
             RETURNING {}",
            SENSOR_COLUMNS
        );
        sqlx::query_as::<_, SensorRow>(&query)
            .bind(id)
            .bind(&update.name)
            .bind(update.sensor_type.as_ref().map(|t| t.as_str()))
            .bind(&update.location)
            .bind(update.value)
            .bind(&update.unit)
            .bind(&update.status)
            .fetch_optional(&self.pool)
            .await?
            .map(Sensor::from)
            .ok_or_else(|| not_found(id))
    }

    async fn delete_sensor(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM sensors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        info!("Deleted sensor {}", id);
        Ok(())
    }
}

#[async_trait]
impl SensorDataBackend for PgSensorStore {
    fn value_kind(&self) -> ValueKind {
        ValueKind::Numeric
    }

    async fn get_sensor_data(&self, id: i32) -> Result<SensorData> {
        let sensor = self.fetch(id).await?;
        Ok(SensorData::from(&sensor))
    }

    async fn update_sensor_data(&self, id: i32, update: &ValueUpdate) -> Result<()> {
        let value = match &update.value {
            SensorValue::Number(n) => *n,
            SensorValue::Text(_) => {
                return Err(Error::Validation(
                    "Invalid sensor value: must be a number".to_string(),
                ))
            }
        };

        let result = sqlx::query(
            "UPDATE sensors SET value = $2, status = COALESCE($3, status), last_updated = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(value)
        .bind(&update.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        debug!("Stored value {} for sensor {}", value, id);
        Ok(())
    }
}
