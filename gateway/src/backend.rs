//! Adapter interfaces shared by the local store and the HTTP clients.

use crate::errors::Result;
use crate::model::{
    Sensor, SensorCreate, SensorData, SensorUpdate, TemperatureResponse, ValueKind, ValueUpdate,
};
use async_trait::async_trait;

/// Sensor CRUD, served by the local store or the sensors service.
#[async_trait]
pub trait SensorBackend: Send + Sync {
    async fn list_sensors(&self) -> Result<Vec<Sensor>>;

    async fn get_sensor(&self, id: i32) -> Result<Sensor>;

    async fn create_sensor(&self, sensor: &SensorCreate) -> Result<Sensor>;

    /// Applies a partial update. Implementations that need a full record
    /// merge it with the current state themselves.
    async fn update_sensor(&self, id: i32, update: &SensorUpdate) -> Result<Sensor>;

    async fn delete_sensor(&self, id: i32) -> Result<()>;
}

/// Sensor value reads and writes, served by the local store or state monitoring.
#[async_trait]
pub trait SensorDataBackend: Send + Sync {
    /// Value representation this backend stores.
    fn value_kind(&self) -> ValueKind;

    async fn get_sensor_data(&self, id: i32) -> Result<SensorData>;

    async fn update_sensor_data(&self, id: i32, update: &ValueUpdate) -> Result<()>;
}

#[async_trait]
pub trait LocationTemperature: Send + Sync {
    async fn temperature_at(&self, location: &str) -> Result<TemperatureResponse>;
}

#[async_trait]
pub trait SensorTemperature: Send + Sync {
    async fn temperature_of(&self, sensor_id: i32) -> Result<TemperatureResponse>;
}
