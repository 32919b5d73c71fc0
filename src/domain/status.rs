/// Train status from the portal (speed, GPS, service level)
use crate::errors::DecodeError;
use crate::utils::epoch_millis;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub connection: bool,
    pub service_level: String,
    /// Current speed in km/h
    pub speed: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub server_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStatus {
    connection: Option<bool>,
    service_level: Option<String>,
    speed: Option<f64>,
    longitude: Option<f64>,
    latitude: Option<f64>,
    server_time: Option<i64>,
}

impl Status {
    pub fn from_json(body: &str) -> Result<Self, DecodeError> {
        let wire: WireStatus = serde_json::from_str(body)?;

        Ok(Self {
            connection: wire.connection.unwrap_or(false),
            service_level: wire.service_level.unwrap_or_default(),
            speed: wire.speed.unwrap_or(f64::NAN),
            longitude: wire.longitude.unwrap_or_default(),
            latitude: wire.latitude.unwrap_or_default(),
            server_time: epoch_millis(wire.server_time),
        })
    }
}
