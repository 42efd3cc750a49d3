use super::ApiClient;
use crate::backend::{LocationTemperature, SensorTemperature};
use crate::errors::Result;
use crate::model::TemperatureResponse;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::instrument;
use url::Url;

#[derive(Debug, Clone)]
pub struct TemperatureClient {
    api: ApiClient,
}

impl TemperatureClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new("temperature-api", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl LocationTemperature for TemperatureClient {
    #[instrument(skip(self))]
    async fn temperature_at(&self, location: &str) -> Result<TemperatureResponse> {
        let request = self
            .api
            .client
            .get(self.api.url(&["temperature"])?)
            .query(&[("location", location)]);
        self.api.fetch(request, StatusCode::OK).await
    }
}

#[async_trait]
impl SensorTemperature for TemperatureClient {
    #[instrument(skip(self))]
    async fn temperature_of(&self, sensor_id: i32) -> Result<TemperatureResponse> {
        let url = self.api.url(&["temperature", &sensor_id.to_string()])?;
        self.api.fetch(self.api.client.get(url), StatusCode::OK).await
    }
}
