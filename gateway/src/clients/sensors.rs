use super::ApiClient;
use crate::backend::{LocationTemperature, SensorBackend};
use crate::errors::Result;
use crate::model::{Sensor, SensorCreate, SensorUpdate, TemperatureResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Client for the legacy sensors service (`/api/v1/sensors`).
#[derive(Debug, Clone)]
pub struct SensorsClient {
    api: ApiClient,
}

impl SensorsClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new("sensors-api", base_url, timeout)?,
        })
    }

    fn sensor_url(&self, id: i32) -> Result<Url> {
        self.api.url(&["api", "v1", "sensors", &id.to_string()])
    }
}

#[async_trait]
impl SensorBackend for SensorsClient {
    #[instrument(skip(self))]
    async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        let url = self.api.url(&["api", "v1", "sensors"])?;
        self.api.fetch(self.api.client.get(url), StatusCode::OK).await
    }

    #[instrument(skip(self))]
    async fn get_sensor(&self, id: i32) -> Result<Sensor> {
        let url = self.sensor_url(id)?;
        self.api.fetch(self.api.client.get(url), StatusCode::OK).await
    }

    #[instrument(skip(self, sensor))]
    async fn create_sensor(&self, sensor: &SensorCreate) -> Result<Sensor> {
        let url = self.api.url(&["api", "v1", "sensors"])?;
        self.api
            .fetch(self.api.client.post(url).json(sensor), StatusCode::CREATED)
            .await
    }

    /// The service replaces the whole record, so the current state is read
    /// first and the partial update laid over it.
    #[instrument(skip(self, update))]
    async fn update_sensor(&self, id: i32, update: &SensorUpdate) -> Result<Sensor> {
        let current = self.get_sensor(id).await?;
        let replacement = current.merged_with(update);
        debug!("Forwarding merged update for sensor {}", id);

        let url = self.sensor_url(id)?;
        self.api
            .fetch(self.api.client.put(url).json(&replacement), StatusCode::OK)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_sensor(&self, id: i32) -> Result<()> {
        let url = self.sensor_url(id)?;
        self.api
            .execute(self.api.client.delete(url), StatusCode::NO_CONTENT)
            .await
    }
}

#[async_trait]
impl LocationTemperature for SensorsClient {
    #[instrument(skip(self))]
    async fn temperature_at(&self, location: &str) -> Result<TemperatureResponse> {
        let url = self
            .api
            .url(&["api", "v1", "sensors", "location", location])?;
        self.api.fetch(self.api.client.get(url), StatusCode::OK).await
    }
}
