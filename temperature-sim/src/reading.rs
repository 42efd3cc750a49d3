use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const TEST_DATA: &str = "test_data";

/// Fixed room/sensor pairs known to the simulator.
const KNOWN_SENSORS: [(&str, &str); 3] = [("1", "Living Room"), ("2", "Bedroom"), ("3", "Kitchen")];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub status: String,
    pub sensor_id: String,
    pub sensor_type: String,
    pub description: String,
}

/// Uniform temperatures between `min` and `max`, one decimal place.
#[derive(Debug, Clone, Copy)]
pub struct TemperatureRange {
    min: f64,
    max: f64,
}

impl TemperatureRange {
    pub fn new(min: f64, max: f64) -> Result<Self, String> {
        if !min.is_finite() || !max.is_finite() {
            return Err("temperature bounds must be finite".to_string());
        }
        if min > max {
            return Err(format!("MIN_TEMP ({}) is above MAX_TEMP ({})", min, max));
        }
        Ok(Self { min, max })
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        let raw = if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        };
        ((raw * 10.0).round() / 10.0).clamp(self.min, self.max)
    }
}

fn location_for(sensor_id: &str) -> &'static str {
    KNOWN_SENSORS
        .iter()
        .find(|(id, _)| *id == sensor_id)
        .map(|(_, location)| *location)
        .unwrap_or("Unknown")
}

fn sensor_id_for(location: &str) -> &'static str {
    KNOWN_SENSORS
        .iter()
        .find(|(_, name)| *name == location)
        .map(|(id, _)| *id)
        .unwrap_or("0")
}

/// Builds a reading, filling whichever of location and sensor ID is missing
/// from the other.
pub fn generate_reading(
    rng: &mut impl Rng,
    range: &TemperatureRange,
    location: Option<&str>,
    sensor_id: Option<&str>,
) -> Reading {
    let location = location.filter(|l| !l.is_empty());
    let sensor_id = sensor_id.filter(|s| !s.is_empty());

    let location = match location {
        Some(location) => location.to_string(),
        None => location_for(sensor_id.unwrap_or_default()).to_string(),
    };
    let sensor_id = match sensor_id {
        Some(sensor_id) => sensor_id.to_string(),
        None => sensor_id_for(&location).to_string(),
    };

    Reading {
        value: range.sample(rng),
        unit: "celsius".to_string(),
        timestamp: Utc::now(),
        location,
        status: TEST_DATA.to_string(),
        sensor_id,
        sensor_type: "temperature".to_string(),
        description: TEST_DATA.to_string(),
    }
}
