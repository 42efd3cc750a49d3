//! Per-operation backend selection.
//!
//! Every routed operation owns one boolean flag. `false` keeps the operation
//! on its primary backend, `true` sends it to the alternate one:
//!
//! | operation               | primary            | alternate                |
//! |-------------------------|--------------------|--------------------------|
//! | sensor CRUD             | local store        | sensors service          |
//! | temperature by location | temperature API    | sensors service          |
//! | sensor value/data       | local store        | state-monitoring service |
//!
//! The table is built once at startup and never changes afterwards.

use crate::errors::{Error, Result};

const OPERATION_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListSensors,
    GetSensor,
    CreateSensor,
    UpdateSensor,
    DeleteSensor,
    TemperatureByLocation,
    UpdateSensorValue,
    GetSensorData,
}

impl Operation {
    pub const ALL: [Operation; OPERATION_COUNT] = [
        Operation::ListSensors,
        Operation::GetSensor,
        Operation::CreateSensor,
        Operation::UpdateSensor,
        Operation::DeleteSensor,
        Operation::TemperatureByLocation,
        Operation::UpdateSensorValue,
        Operation::GetSensorData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ListSensors => "list_sensors",
            Operation::GetSensor => "get_sensor",
            Operation::CreateSensor => "create_sensor",
            Operation::UpdateSensor => "update_sensor",
            Operation::DeleteSensor => "delete_sensor",
            Operation::TemperatureByLocation => "temperature_by_location",
            Operation::UpdateSensorValue => "update_sensor_value",
            Operation::GetSensorData => "get_sensor_data",
        }
    }

    /// Environment variable holding this operation's routing flag.
    pub fn flag_var(self) -> &'static str {
        match self {
            Operation::ListSensors => "SENSORS_API_GET_SENSORS",
            Operation::GetSensor => "SENSORS_API_GET_SENSOR_BY_ID",
            Operation::CreateSensor => "SENSORS_API_CREATE_SENSOR",
            Operation::UpdateSensor => "SENSORS_API_UPDATE_SENSOR",
            Operation::DeleteSensor => "SENSORS_API_DELETE_SENSOR",
            Operation::TemperatureByLocation => "SENSORS_API_GET_TEMPERATURE_BY_LOCATION",
            Operation::UpdateSensorValue => "STATEMON_API_UPDATE_SENSOR_DATA",
            Operation::GetSensorData => "STATEMON_API_GET_SENSOR_DATA",
        }
    }

    fn default_flag(self) -> bool {
        !matches!(self, Operation::TemperatureByLocation)
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Primary,
    Alternate,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Primary => "primary",
            Route::Alternate => "alternate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    alternate: [bool; OPERATION_COUNT],
}

impl Default for RoutingTable {
    fn default() -> Self {
        let mut alternate = [false; OPERATION_COUNT];
        for op in Operation::ALL {
            alternate[op.index()] = op.default_flag();
        }
        Self { alternate }
    }
}

impl RoutingTable {
    /// Every operation on the same route.
    pub fn uniform(route: Route) -> Self {
        Self {
            alternate: [route == Route::Alternate; OPERATION_COUNT],
        }
    }

    pub fn with(mut self, op: Operation, route: Route) -> Self {
        self.alternate[op.index()] = route == Route::Alternate;
        self
    }

    pub fn route(&self, op: Operation) -> Route {
        if self.alternate[op.index()] {
            Route::Alternate
        } else {
            Route::Primary
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut table = Self::default();
        for op in Operation::ALL {
            let var = op.flag_var();
            table.alternate[op.index()] = parse_flag(var, lookup(var), op.default_flag())?;
        }
        Ok(table)
    }
}

/// Unset or blank falls back to the default; anything unrecognised is fatal.
pub fn parse_flag(var: &str, raw: Option<String>, default: bool) -> Result<bool> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(default),
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be a boolean, got {:?}",
            var, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let table = RoutingTable::from_lookup(|_| None).unwrap();
        assert_eq!(table.route(Operation::ListSensors), Route::Alternate);
        assert_eq!(table.route(Operation::UpdateSensorValue), Route::Alternate);
        assert_eq!(table.route(Operation::TemperatureByLocation), Route::Primary);
        assert_eq!(table, RoutingTable::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let table = RoutingTable::from_lookup(lookup(&[
            ("SENSORS_API_GET_SENSORS", "false"),
            ("SENSORS_API_GET_TEMPERATURE_BY_LOCATION", " TRUE "),
            ("STATEMON_API_GET_SENSOR_DATA", "0"),
        ]))
        .unwrap();
        assert_eq!(table.route(Operation::ListSensors), Route::Primary);
        assert_eq!(table.route(Operation::TemperatureByLocation), Route::Alternate);
        assert_eq!(table.route(Operation::GetSensorData), Route::Primary);
        assert_eq!(table.route(Operation::DeleteSensor), Route::Alternate);
    }

    #[test]
    fn test_malformed_flag_is_fatal() {
        let result = RoutingTable::from_lookup(lookup(&[("SENSORS_API_DELETE_SENSOR", "maybe")]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("SENSORS_API_DELETE_SENSOR")));
    }

    #[test]
    fn test_blank_flag_uses_default() {
        assert!(parse_flag("X", Some("  ".to_string()), true).unwrap());
        assert!(!parse_flag("X", None, false).unwrap());
        assert!(parse_flag("X", Some("on".to_string()), false).unwrap());
    }

    #[test]
    fn test_single_operation_override() {
        let table = RoutingTable::uniform(Route::Primary).with(Operation::CreateSensor, Route::Alternate);
        for op in Operation::ALL {
            let expected = if op == Operation::CreateSensor {
                Route::Alternate
            } else {
                Route::Primary
            };
            assert_eq!(table.route(op), expected, "{}", op.as_str());
        }
    }
}
