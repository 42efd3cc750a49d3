use crate::backend::{LocationTemperature, SensorBackend, SensorDataBackend, SensorTemperature};
use crate::enrich::enrich_temperatures;
use crate::errors::Result;
use crate::metrics::{BACKEND_CALLS_TOTAL, BACKEND_ERRORS_TOTAL, BACKEND_LATENCY_SECONDS};
use crate::model::{Sensor, SensorCreate, SensorData, SensorUpdate, TemperatureResponse};
use crate::routing::{Operation, Route, RoutingTable};
use crate::validate::{resolve_value_update, validate_create, validate_location, validate_update};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Every adapter the gateway can route to.
#[derive(Clone)]
pub struct Backends {
    /// Local store for sensor CRUD.
    pub store: Arc<dyn SensorBackend>,
    /// Local store for sensor values.
    pub store_data: Arc<dyn SensorDataBackend>,
    pub sensors_api: Arc<dyn SensorBackend>,
    pub sensors_api_location: Arc<dyn LocationTemperature>,
    pub state_monitoring: Arc<dyn SensorDataBackend>,
    pub temperature_location: Arc<dyn LocationTemperature>,
    pub temperature_live: Arc<dyn SensorTemperature>,
}

/// Routes each operation to its configured backend.
#[derive(Clone)]
pub struct Gateway {
    routes: RoutingTable,
    backends: Backends,
}

impl Gateway {
    pub fn new(routes: RoutingTable, backends: Backends) -> Self {
        for op in Operation::ALL {
            info!("Routing {} via {} backend", op.as_str(), routes.route(op).as_str());
        }
        Self { routes, backends }
    }

    fn sensors(&self, op: Operation) -> &dyn SensorBackend {
        match self.routes.route(op) {
            Route::Primary => self.backends.store.as_ref(),
            Route::Alternate => self.backends.sensors_api.as_ref(),
        }
    }

    fn sensor_data(&self, op: Operation) -> &dyn SensorDataBackend {
        match self.routes.route(op) {
            Route::Primary => self.backends.store_data.as_ref(),
            Route::Alternate => self.backends.state_monitoring.as_ref(),
        }
    }

    fn location_temperature(&self) -> &dyn LocationTemperature {
        match self.routes.route(Operation::TemperatureByLocation) {
            Route::Primary => self.backends.temperature_location.as_ref(),
            Route::Alternate => self.backends.sensors_api_location.as_ref(),
        }
    }

    /// Runs one backend call with metrics and error logging around it.
    async fn call<T, F>(&self, op: Operation, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let route = self.routes.route(op);
        BACKEND_CALLS_TOTAL
            .with_label_values(&[op.as_str(), route.as_str()])
            .inc();

        let start = Instant::now();
        let result = fut.await;
        BACKEND_LATENCY_SECONDS
            .with_label_values(&[op.as_str()])
            .observe(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            BACKEND_ERRORS_TOTAL
                .with_label_values(&[op.as_str(), e.kind()])
                .inc();
            warn!(
                operation = op.as_str(),
                route = route.as_str(),
                kind = e.kind(),
                "Backend call failed: {}",
                e
            );
        }
        result
    }

    pub async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        let op = Operation::ListSensors;
        let mut sensors = self.call(op, self.sensors(op).list_sensors()).await?;

        // Externally sourced lists are already live.
        if self.routes.route(op) == Route::Primary {
            let enriched =
                enrich_temperatures(self.backends.temperature_live.as_ref(), &mut sensors).await;
            debug!("Enriched {} of {} sensors", enriched, sensors.len());
        }
        Ok(sensors)
    }

    pub async fn get_sensor(&self, id: i32) -> Result<Sensor> {
        let op = Operation::GetSensor;
        self.call(op, self.sensors(op).get_sensor(id)).await
    }

    pub async fn create_sensor(&self, sensor: SensorCreate) -> Result<Sensor> {
        validate_create(&sensor)?;
        let op = Operation::CreateSensor;
        self.call(op, self.sensors(op).create_sensor(&sensor)).await
    }

    pub async fn update_sensor(&self, id: i32, update: SensorUpdate) -> Result<Sensor> {
        validate_update(&update)?;
        let op = Operation::UpdateSensor;
        self.call(op, self.sensors(op).update_sensor(id, &update))
            .await
    }

    pub async fn delete_sensor(&self, id: i32) -> Result<()> {
        let op = Operation::DeleteSensor;
        self.call(op, self.sensors(op).delete_sensor(id)).await
    }

    /// Type-checks the value against the routed backend before calling it.
    pub async fn update_sensor_value(&self, id: i32, data: SensorData) -> Result<()> {
        let op = Operation::UpdateSensorValue;
        let backend = self.sensor_data(op);
        let mut update = resolve_value_update(data, backend.value_kind())?;
        if self.routes.route(op) == Route::Alternate {
            update = update.with_defaults(Utc::now());
        }
        self.call(op, backend.update_sensor_data(id, &update)).await
    }

    pub async fn get_sensor_data(&self, id: i32) -> Result<SensorData> {
        let op = Operation::GetSensorData;
        self.call(op, self.sensor_data(op).get_sensor_data(id)).await
    }

    pub async fn temperature_by_location(&self, location: &str) -> Result<TemperatureResponse> {
        validate_location(location)?;
        let op = Operation::TemperatureByLocation;
        self.call(op, self.location_temperature().temperature_at(location))
            .await
    }
}
