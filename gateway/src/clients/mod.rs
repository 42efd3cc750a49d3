//! HTTP clients for the external sensor, state-monitoring and temperature APIs.
//!
//! All three share [`ApiClient`], which turns a raw response into either the
//! declared payload or one of the normalized error kinds.

mod sensors;
mod state_monitoring;
mod temperature;

pub use sensors::SensorsClient;
pub use state_monitoring::StateMonitoringClient;
pub use temperature::TemperatureClient;

use crate::errors::{Error, Result};
use crate::model::ErrorResponse;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct ApiClient {
    service: &'static str,
    client: Client,
    base_url: Url,
}

impl ApiClient {
    fn new(service: &'static str, base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build {} client: {}", service, e)))?;
        Ok(Self {
            service,
            client,
            base_url,
        })
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{} base URL cannot carry a path", self.service)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|source| {
            if source.is_timeout() {
                warn!("{} request timed out: {}", self.service, source);
            } else {
                warn!("{} unreachable: {}", self.service, source);
            }
            Error::Transport {
                service: self.service,
                source,
            }
        })
    }

    /// Sends the request and decodes the body when the status matches `expected`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> Result<T> {
        let response = self.send(request).await?;
        let status = response.status();
        if status != expected {
            return Err(self.error_from(response).await);
        }

        let body = response.bytes().await.map_err(|source| Error::Transport {
            service: self.service,
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| {
            error!(
                "Malformed {} response ({}): {}",
                self.service,
                source,
                String::from_utf8_lossy(&body)
            );
            Error::Decode {
                service: self.service,
                source,
            }
        })
    }

    /// Sends the request and only checks the status.
    async fn execute(&self, request: RequestBuilder, expected: StatusCode) -> Result<()> {
        let response = self.send(request).await?;
        if response.status() != expected {
            return Err(self.error_from(response).await);
        }
        debug!("{} answered {}", self.service, expected);
        Ok(())
    }

    /// Structured body when the backend sent one, the bare status otherwise.
    async fn error_from(&self, response: Response) -> Error {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read {} error body: {}", self.service, e);
                String::new()
            }
        };
        warn!(
            "{} returned unexpected status {}, response: {}",
            self.service, status, body
        );

        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(structured) => Error::Api {
                status: structured.status_code.unwrap_or_else(|| status.as_u16()),
                message: structured.error,
            },
            Err(_) => Error::UnexpectedStatus {
                service: self.service,
                status: status.as_u16(),
            },
        }
    }
}
