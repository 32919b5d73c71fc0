/// GPS position reported by the on-board router
use crate::errors::DecodeError;
use crate::utils::{epoch_secs, parse_quoted, strip_jsonp};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const MPS_TO_KMH: f64 = 3.6;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub version: String,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Speed in km/h
    pub speed: f64,
    pub satellites: u32,
}

/// Every value arrives as a string
#[derive(Debug, Deserialize)]
struct WirePosition {
    version: Option<String>,
    time: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    altitude: Option<String>,
    /// m/s
    speed: Option<String>,
    satellites: Option<String>,
}

impl Position {
    pub fn from_jsonp(body: &str) -> Result<Self, DecodeError> {
        let wire: WirePosition = serde_json::from_str(strip_jsonp(body))?;
        let speed: f64 = parse_quoted("speed", wire.speed.as_deref())?;

        Ok(Self {
            version: wire.version.unwrap_or_default(),
            time: epoch_secs(Some(parse_quoted("time", wire.time.as_deref())?)),
            latitude: parse_quoted("latitude", wire.latitude.as_deref())?,
            longitude: parse_quoted("longitude", wire.longitude.as_deref())?,
            altitude: parse_quoted("altitude", wire.altitude.as_deref())?,
            speed: speed * MPS_TO_KMH,
            satellites: parse_quoted("satellites", wire.satellites.as_deref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_position() {
        let got = Position::from_jsonp(include_str!("testdata/position.jsonp")).unwrap();

        let want = Position {
            version: "1.9".to_string(),
            time: Utc.timestamp_opt(1488959212, 0).unwrap(),
            latitude: 48.694882,
            longitude: 11.45607,
            altitude: 371.4,
            speed: 44.206 * 3.6,
            satellites: 10,
        };
        assert_eq!(got, want);
    }

    #[test]
    fn test_reject_unquoted_garbage() {
        let err = Position::from_jsonp(r#"({"speed":"fast"});"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "speed", .. }));
    }
}
