use crate::backend::SensorTemperature;
use crate::metrics::{ENRICHED_SENSORS_TOTAL, ENRICHMENT_FAILURES_TOTAL};
use crate::model::{Sensor, SensorType};
use futures::future::join_all;
use tracing::{debug, warn};

/// Overlays live readings on every temperature sensor in `sensors`.
///
/// Lookups run concurrently. A failed lookup leaves that sensor as stored and
/// never fails the batch. Returns how many sensors were updated.
pub async fn enrich_temperatures(source: &dyn SensorTemperature, sensors: &mut [Sensor]) -> usize {
    let lookups = sensors.iter().map(|sensor| async move {
        if sensor.sensor_type != SensorType::Temperature {
            return None;
        }
        Some(source.temperature_of(sensor.id).await)
    });
    let readings = join_all(lookups).await;

    let mut enriched = 0;
    for (sensor, reading) in sensors.iter_mut().zip(readings) {
        match reading {
            None => {}
            Some(Ok(reading)) => {
                sensor.apply_reading(&reading);
                enriched += 1;
                debug!("Updated temperature data for sensor {} from live reading", sensor.id);
            }
            Some(Err(e)) => {
                ENRICHMENT_FAILURES_TOTAL.inc();
                warn!(
                    sensor_id = sensor.id,
                    kind = e.kind(),
                    "Failed to fetch temperature data: {}",
                    e
                );
            }
        }
    }

    ENRICHED_SENSORS_TOTAL.inc_by(enriched as f64);
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Error, Result};
    use crate::model::TemperatureResponse;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct FakeReadings {
        failing: i32,
        calls: Mutex<Vec<i32>>,
    }

    #[async_trait]
    impl SensorTemperature for FakeReadings {
        async fn temperature_of(&self, sensor_id: i32) -> Result<TemperatureResponse> {
            self.calls.lock().unwrap().push(sensor_id);
            if sensor_id == self.failing {
                return Err(Error::UnexpectedStatus {
                    service: "temperature-api",
                    status: 503,
                });
            }
            Ok(TemperatureResponse {
                value: 20.0 + sensor_id as f64,
                unit: "celsius".to_string(),
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
                location: String::new(),
                status: "active".to_string(),
                sensor_id: sensor_id.to_string(),
                sensor_type: "temperature".to_string(),
                description: String::new(),
            })
        }
    }

    fn sensor(id: i32, sensor_type: SensorType) -> Sensor {
        Sensor {
            id,
            name: format!("sensor-{}", id),
            sensor_type,
            location: "Lab".to_string(),
            value: Some(1.0),
            unit: None,
            status: Some("stored".to_string()),
            last_updated: "2024-01-01T00:00:00+00:00".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_partial_failure_keeps_order_and_stored_values() {
        let source = FakeReadings {
            failing: 2,
            calls: Mutex::new(Vec::new()),
        };
        let mut sensors = vec![
            sensor(1, SensorType::Temperature),
            sensor(2, SensorType::Temperature),
            sensor(3, SensorType::Other("humidity".to_string())),
            sensor(4, SensorType::Temperature),
        ];

        let enriched = tokio_test::block_on(enrich_temperatures(&source, &mut sensors));

        assert_eq!(enriched, 2);
        let ids: Vec<i32> = sensors.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(sensors[0].value, Some(21.0));
        assert_eq!(sensors[0].last_updated, "2024-05-01T08:30:00+00:00");
        assert_eq!(sensors[1].value, Some(1.0));
        assert_eq!(sensors[1].status.as_deref(), Some("stored"));
        assert_eq!(sensors[2].status.as_deref(), Some("stored"));
        assert_eq!(sensors[3].value, Some(24.0));

        let mut calls = source.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec![1, 2, 4]);
    }
}
