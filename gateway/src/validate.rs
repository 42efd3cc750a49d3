use crate::errors::{Error, Result};
use crate::model::{SensorCreate, SensorData, SensorUpdate, SensorValue, ValueKind, ValueUpdate};
use serde_json::Value;

const NAME_MAX: usize = 100;
const LOCATION_MAX: usize = 200;
const UNIT_MAX: usize = 20;
const STATUS_MAX: usize = 50;

/// Parses a sensor ID taken from the request path.
pub fn parse_sensor_id(raw: &str) -> Result<i32> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::Validation("Invalid sensor ID".to_string())),
    }
}

pub fn validate_location(location: &str) -> Result<()> {
    if location.trim().is_empty() {
        return Err(Error::Validation("Location is required".to_string()));
    }
    Ok(())
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", field)));
    }
    if len > max {
        return Err(Error::Validation(format!(
            "{} is {} characters long, limit is {}",
            field, len, max
        )));
    }
    Ok(())
}

pub fn validate_create(sensor: &SensorCreate) -> Result<()> {
    check_length("name", &sensor.name, NAME_MAX)?;
    check_length("type", sensor.sensor_type.as_str(), NAME_MAX)?;
    check_length("location", &sensor.location, LOCATION_MAX)?;
    if let Some(unit) = &sensor.unit {
        check_length("unit", unit, UNIT_MAX)?;
    }
    Ok(())
}

pub fn validate_update(update: &SensorUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(Error::Validation(
            "Update must contain at least one field".to_string(),
        ));
    }
    if let Some(name) = &update.name {
        check_length("name", name, NAME_MAX)?;
    }
    if let Some(sensor_type) = &update.sensor_type {
        check_length("type", sensor_type.as_str(), NAME_MAX)?;
    }
    if let Some(location) = &update.location {
        check_length("location", location, LOCATION_MAX)?;
    }
    if let Some(unit) = &update.unit {
        check_length("unit", unit, UNIT_MAX)?;
    }
    if let Some(status) = &update.status {
        check_length("status", status, STATUS_MAX)?;
    }
    Ok(())
}

/// Fixes the type of an incoming value against what the routed backend stores.
pub fn resolve_value_update(data: SensorData, expected: ValueKind) -> Result<ValueUpdate> {
    let value = match (expected, data.value) {
        (ValueKind::Numeric, Value::Number(n)) => n.as_f64().map(SensorValue::Number),
        (ValueKind::Text, Value::String(s)) => Some(SensorValue::Text(s)),
        _ => None,
    }
    .ok_or_else(|| {
        Error::Validation(format!(
            "Invalid sensor value: must be {}",
            expected.describe()
        ))
    })?;

    let update = ValueUpdate {
        value,
        location: data.location.filter(|s| !s.is_empty()),
        unit: data.unit.filter(|s| !s.is_empty()),
        status: data.status.filter(|s| !s.is_empty()),
        created_at: data.created_at.filter(|s| !s.is_empty()),
    };
    if let Some(location) = &update.location {
        check_length("location", location, LOCATION_MAX)?;
    }
    if let Some(unit) = &update.unit {
        check_length("unit", unit, UNIT_MAX)?;
    }
    if let Some(status) = &update.status {
        check_length("status", status, STATUS_MAX)?;
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SensorType;
    use serde_json::json;

    fn sensor_data(value: Value) -> SensorData {
        SensorData {
            id: 1,
            location: Some("Kitchen".to_string()),
            unit: Some(String::new()),
            status: None,
            created_at: None,
            value,
        }
    }

    #[test]
    fn test_sensor_id() {
        assert_eq!(parse_sensor_id("42").unwrap(), 42);
        assert!(parse_sensor_id("abc").is_err());
        assert!(parse_sensor_id("0").is_err());
        assert!(parse_sensor_id("-3").is_err());
        assert!(parse_sensor_id("99999999999").is_err());
    }

    #[test]
    fn test_blank_location() {
        assert!(validate_location("").is_err());
        assert!(validate_location("   ").is_err());
        assert!(validate_location("Living Room").is_ok());
    }

    #[test]
    fn test_valid_create() {
        let sensor = SensorCreate {
            name: "Kitchen thermometer".to_string(),
            sensor_type: SensorType::Temperature,
            location: "Kitchen".to_string(),
            unit: Some("celsius".to_string()),
        };
        assert!(validate_create(&sensor).is_ok());
    }

    #[test]
    fn test_create_with_long_name() {
        let sensor = SensorCreate {
            name: "x".repeat(NAME_MAX + 1),
            sensor_type: SensorType::Temperature,
            location: "Kitchen".to_string(),
            unit: None,
        };
        assert!(validate_create(&sensor).is_err());
    }

    #[test]
    fn test_create_with_empty_unit() {
        let sensor = SensorCreate {
            name: "Hall".to_string(),
            sensor_type: SensorType::Temperature,
            location: "Hall".to_string(),
            unit: Some(String::new()),
        };
        assert!(validate_create(&sensor).is_err());
    }

    #[test]
    fn test_empty_update() {
        assert!(validate_update(&SensorUpdate::default()).is_err());
        let update = SensorUpdate {
            value: Some(3.5),
            ..Default::default()
        };
        assert!(validate_update(&update).is_ok());
    }

    #[test]
    fn test_update_with_long_status() {
        let update = SensorUpdate {
            status: Some("s".repeat(STATUS_MAX + 1)),
            ..Default::default()
        };
        assert!(matches!(validate_update(&update), Err(Error::Validation(msg)) if msg.contains("status")));

        let update = SensorUpdate {
            status: Some("s".repeat(STATUS_MAX)),
            ..Default::default()
        };
        assert!(validate_update(&update).is_ok());
    }

    #[test]
    fn test_value_update_with_long_status() {
        let mut data = sensor_data(json!(21.5));
        data.status = Some("s".repeat(STATUS_MAX + 1));
        let err = resolve_value_update(data, ValueKind::Numeric);
        assert!(matches!(err, Err(Error::Validation(msg)) if msg.contains("status")));

        let mut data = sensor_data(json!("open"));
        data.unit = Some("u".repeat(UNIT_MAX + 1));
        assert!(resolve_value_update(data, ValueKind::Text).is_err());
    }

    #[test]
    fn test_numeric_route_rejects_string() {
        let err = resolve_value_update(sensor_data(json!("21.5")), ValueKind::Numeric);
        assert!(matches!(err, Err(Error::Validation(msg)) if msg.contains("number")));
    }

    #[test]
    fn test_text_route_rejects_number() {
        assert!(resolve_value_update(sensor_data(json!(21.5)), ValueKind::Text).is_err());
        assert!(resolve_value_update(sensor_data(Value::Null), ValueKind::Text).is_err());
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let update = resolve_value_update(sensor_data(json!(21.5)), ValueKind::Numeric).unwrap();
        assert_eq!(update.value, SensorValue::Number(21.5));
        assert_eq!(update.unit, None);
        assert_eq!(update.location.as_deref(), Some("Kitchen"));
    }
}
