use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sensor kind. Only temperature sensors get special treatment; every other
/// type string is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SensorType {
    Temperature,
    Other(String),
}

impl SensorType {
    pub fn as_str(&self) -> &str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Other(other) => other,
        }
    }
}

impl From<String> for SensorType {
    fn from(value: String) -> Self {
        if value == "temperature" {
            SensorType::Temperature
        } else {
            SensorType::Other(value)
        }
    }
}

impl From<SensorType> for String {
    fn from(value: SensorType) -> Self {
        match value {
            SensorType::Temperature => "temperature".to_string(),
            SensorType::Other(other) => other,
        }
    }
}

/// A smart-home sensor as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "rfc3339_timestamp")]
    pub last_updated: String,
    #[serde(default, deserialize_with = "rfc3339_timestamp")]
    pub created_at: String,
}

impl Sensor {
    /// Overlay a live reading on top of the stored values.
    pub fn apply_reading(&mut self, reading: &TemperatureResponse) {
        self.value = Some(reading.value);
        if !reading.status.is_empty() {
            self.status = Some(reading.status.clone());
        }
        self.last_updated = reading.timestamp.to_rfc3339();
    }

    /// Full replacement record: stored values overlaid with the supplied fields.
    pub fn merged_with(&self, update: &SensorUpdate) -> SensorUpdate {
        SensorUpdate {
            name: update.name.clone().or_else(|| Some(self.name.clone())),
            sensor_type: update
                .sensor_type
                .clone()
                .or_else(|| Some(self.sensor_type.clone())),
            location: update.location.clone().or_else(|| Some(self.location.clone())),
            value: update.value.or(self.value),
            unit: update.unit.clone().or_else(|| self.unit.clone()),
            status: update.status.clone().or_else(|| self.status.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Partial update; unset fields keep their stored values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<SensorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SensorUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sensor_type.is_none()
            && self.location.is_none()
            && self.value.is_none()
            && self.unit.is_none()
            && self.status.is_none()
    }
}

/// Value-update envelope. `value` stays untyped on the wire; the route decides
/// whether a number or a string is acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    #[serde(default)]
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, alias = "ts", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl From<&Sensor> for SensorData {
    fn from(sensor: &Sensor) -> Self {
        Self {
            id: sensor.id,
            location: Some(sensor.location.clone()),
            unit: sensor.unit.clone(),
            status: sensor.status.clone(),
            created_at: Some(sensor.last_updated.clone()),
            value: sensor.value.map(Value::from).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Text,
}

impl ValueKind {
    pub fn describe(self) -> &'static str {
        match self {
            ValueKind::Numeric => "a number",
            ValueKind::Text => "a string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SensorValue {
    Number(f64),
    Text(String),
}

impl SensorValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SensorValue::Number(_) => ValueKind::Numeric,
            SensorValue::Text(_) => ValueKind::Text,
        }
    }
}

/// A value update after the route has fixed the value's type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueUpdate {
    pub value: SensorValue,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

pub const UNKNOWN: &str = "unknown";

impl ValueUpdate {
    /// Fill in what the state-monitoring service requires.
    pub fn with_defaults(mut self, now: DateTime<Utc>) -> Self {
        if self.created_at.is_none() {
            self.created_at = Some(now.to_rfc3339());
        }
        if self.unit.is_none() {
            self.unit = Some(UNKNOWN.to_string());
        }
        if self.status.is_none() {
            self.status = Some(UNKNOWN.to_string());
        }
        self
    }

    pub fn to_sensor_data(&self, id: i32) -> SensorData {
        SensorData {
            id,
            location: self.location.clone(),
            unit: self.unit.clone(),
            status: self.status.clone(),
            created_at: self.created_at.clone(),
            value: match &self.value {
                SensorValue::Number(n) => Value::from(*n),
                SensorValue::Text(s) => Value::from(s.clone()),
            },
        }
    }
}

/// Reading from the temperature API (or the sensors service location lookup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureResponse {
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub sensor_id: String,
    #[serde(default)]
    pub sensor_type: String,
    #[serde(default)]
    pub description: String,
}

/// Accepts RFC 3339, the RFC 2822 dates Flask emits, and naive ISO times (taken as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn flexible_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}")))
}

/// Sensor timestamps are re-emitted as RFC 3339 whatever the backend sent.
fn rfc3339_timestamp<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(String::new()),
        Some(raw) if raw.trim().is_empty() => Ok(String::new()),
        Some(raw) => parse_timestamp(&raw)
            .map(|ts| ts.to_rfc3339())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}"))),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Body of `GET /sensors/temperature/{location}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperaturePayload {
    pub location: String,
    pub value: f64,
    pub unit: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl From<TemperatureResponse> for TemperaturePayload {
    fn from(reading: TemperatureResponse) -> Self {
        Self {
            location: reading.location,
            value: reading.value,
            unit: reading.unit,
            status: reading.status,
            timestamp: reading.timestamp,
            description: reading.description,
        }
    }
}

/// Uniform error body, both emitted by the gateway and recognized from backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, alias = "status", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored_sensor() -> Sensor {
        Sensor {
            id: 7,
            name: "Hall".to_string(),
            sensor_type: SensorType::Temperature,
            location: "Hallway".to_string(),
            value: None,
            unit: Some("celsius".to_string()),
            status: None,
            last_updated: "2024-01-01T00:00:00+00:00".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_unset_optionals_are_omitted() {
        let encoded = serde_json::to_value(stored_sensor()).unwrap();
        let object = encoded.as_object().unwrap();
        assert!(!object.contains_key("value"));
        assert!(!object.contains_key("status"));
        assert_eq!(object["type"], json!("temperature"));
    }

    #[test]
    fn test_sensor_type_keeps_unknown_strings() {
        let sensor_type: SensorType = serde_json::from_value(json!("humidity")).unwrap();
        assert_eq!(sensor_type, SensorType::Other("humidity".to_string()));
        assert_eq!(serde_json::to_value(&sensor_type).unwrap(), json!("humidity"));
    }

    #[test]
    fn test_merge_prefers_supplied_fields() {
        let update = SensorUpdate {
            name: Some("Porch".to_string()),
            status: Some("active".to_string()),
            ..Default::default()
        };
        let merged = stored_sensor().merged_with(&update);
        assert_eq!(merged.name.as_deref(), Some("Porch"));
        assert_eq!(merged.location.as_deref(), Some("Hallway"));
        assert_eq!(merged.unit.as_deref(), Some("celsius"));
        assert_eq!(merged.status.as_deref(), Some("active"));
        assert_eq!(merged.value, None);
    }

    #[test]
    fn test_temperature_accepts_rfc2822_and_numeric_id() {
        let reading: TemperatureResponse = serde_json::from_value(json!({
            "value": 21.5,
            "unit": "celsius",
            "timestamp": "Tue, 02 Jan 2024 10:00:00 GMT",
            "location": "Kitchen",
            "status": "test_data",
            "sensor_id": 3,
        }))
        .unwrap();
        assert_eq!(reading.sensor_id, "3");
        assert_eq!(reading.timestamp.to_rfc3339(), "2024-01-02T10:00:00+00:00");
        assert!(reading.description.is_empty());
    }

    #[test]
    fn test_apply_reading_overlays_live_fields() {
        let mut sensor = stored_sensor();
        let reading: TemperatureResponse = serde_json::from_value(json!({
            "value": 19.0,
            "timestamp": "2024-03-01T12:00:00Z",
            "status": "active",
        }))
        .unwrap();
        sensor.apply_reading(&reading);
        assert_eq!(sensor.value, Some(19.0));
        assert_eq!(sensor.status.as_deref(), Some("active"));
        assert_eq!(sensor.last_updated, "2024-03-01T12:00:00+00:00");
        assert_eq!(sensor.unit.as_deref(), Some("celsius"));
    }

    #[test]
    fn test_sensor_timestamps_normalized_to_rfc3339() {
        let sensor: Sensor = serde_json::from_value(json!({
            "id": 3,
            "name": "Kitchen",
            "type": "temperature",
            "location": "Kitchen",
            "last_updated": "Tue, 02 Jan 2024 10:00:00 GMT",
            "created_at": "2024-01-01T08:00:00.250",
        }))
        .unwrap();
        assert_eq!(sensor.last_updated, "2024-01-02T10:00:00+00:00");
        assert_eq!(sensor.created_at, "2024-01-01T08:00:00.250+00:00");

        let bare: Sensor = serde_json::from_value(json!({
            "id": 4,
            "name": "Hall",
            "type": "motion",
            "location": "Hall",
            "last_updated": null,
        }))
        .unwrap();
        assert!(bare.last_updated.is_empty());
        assert!(bare.created_at.is_empty());

        let broken = serde_json::from_value::<Sensor>(json!({
            "id": 5,
            "name": "Hall",
            "type": "motion",
            "location": "Hall",
            "last_updated": "yesterday",
        }));
        assert!(broken.is_err());
    }

    #[test]
    fn test_apply_reading_without_status_keeps_stored_status() {
        let mut sensor = stored_sensor();
        let reading: TemperatureResponse = serde_json::from_value(json!({
            "value": 18.5,
            "timestamp": "2024-03-01T12:00:00Z",
        }))
        .unwrap();
        sensor.apply_reading(&reading);
        assert_eq!(sensor.value, Some(18.5));
        assert_eq!(sensor.status, None);
        assert!(!serde_json::to_value(&sensor)
            .unwrap()
            .as_object()
            .unwrap()
            .contains_key("status"));
    }

    #[test]
    fn test_error_body_accepts_legacy_status_key() {
        let body: ErrorResponse =
            serde_json::from_str(r#"{"error": "Sensor not found", "status": 404}"#).unwrap();
        assert_eq!(body.status_code, Some(404));
        assert!(serde_json::from_str::<ErrorResponse>(r#"{"detail": "nope"}"#).is_err());
    }

    #[test]
    fn test_state_monitoring_defaults() {
        let now = Utc::now();
        let update = ValueUpdate {
            value: SensorValue::Text("open".to_string()),
            location: None,
            unit: None,
            status: Some("active".to_string()),
            created_at: None,
        }
        .with_defaults(now);
        assert_eq!(update.unit.as_deref(), Some(UNKNOWN));
        assert_eq!(update.status.as_deref(), Some("active"));
        assert_eq!(update.created_at, Some(now.to_rfc3339()));
    }
}
