use super::ApiClient;
use crate::backend::SensorDataBackend;
use crate::errors::Result;
use crate::model::{SensorData, ValueKind, ValueUpdate};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// Client for the state-monitoring service, which keeps sensor values as strings.
#[derive(Debug, Clone)]
pub struct StateMonitoringClient {
    api: ApiClient,
}

impl StateMonitoringClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new("state-monitoring-api", base_url, timeout)?,
        })
    }

    fn data_url(&self) -> Result<Url> {
        self.api.url(&["api", "v1", "sensor", "data"])
    }
}

#[async_trait]
impl SensorDataBackend for StateMonitoringClient {
    fn value_kind(&self) -> ValueKind {
        ValueKind::Text
    }

    #[instrument(skip(self))]
    async fn get_sensor_data(&self, id: i32) -> Result<SensorData> {
        let request = self
            .api
            .client
            .get(self.data_url()?)
            .query(&[("sensor_id", id)]);
        self.api.fetch(request, StatusCode::OK).await
    }

    /// Expects `update` to already carry unit, status and created_at.
    #[instrument(skip(self, update))]
    async fn update_sensor_data(&self, id: i32, update: &ValueUpdate) -> Result<()> {
        let request = self
            .api
            .client
            .post(self.data_url()?)
            .query(&[("sensor_id", id)])
            .json(&update.to_sensor_data(id));
        self.api.execute(request, StatusCode::NO_CONTENT).await
    }
}
