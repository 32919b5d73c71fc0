/// Trip schedule, current position and per-stop delays
use crate::errors::DecodeError;
use crate::utils::{epoch_millis, is_epoch};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// A train station
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A scheduled stop along the route. Distances are in kilometers.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub station: Station,
    pub platform: String,
    pub distance_from_start: f64,
    pub distance_from_previous: f64,
    pub passed: bool,
    pub scheduled_arrival: DateTime<Utc>,
    pub actual_arrival: DateTime<Utc>,
    pub scheduled_departure: DateTime<Utc>,
    pub actual_departure: DateTime<Utc>,
}

impl Stop {
    /// Delay of departure for passed stops, expected delay of arrival otherwise.
    /// Positive means late; `None` if a participating timestamp is missing.
    pub fn delay(&self) -> Option<Duration> {
        if self.passed {
            between(self.scheduled_departure, self.actual_departure)
        } else {
            between(self.scheduled_arrival, self.actual_arrival)
        }
    }

    /// Time left until the server's arrival estimate; zero once passed.
    /// Stale estimates yield negative durations.
    pub fn eta_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.passed {
            return Some(Duration::zero());
        }
        if is_epoch(&self.actual_arrival) {
            return None;
        }
        Some(self.actual_arrival - now)
    }

    fn from_wire(index: usize, wire: WireStop) -> Result<Self, DecodeError> {
        let station = wire.station.ok_or(DecodeError::MissingStation(index))?;
        let coordinates = station.geocoordinates.unwrap_or_default();
        let track = wire.track.unwrap_or_default();
        let info = wire.info.unwrap_or_default();
        let timetable = wire.timetable.unwrap_or_default();

        let platform = match track.actual {
            Some(actual) if !actual.is_empty() => actual,
            _ => track.scheduled.unwrap_or_default(),
        };

        Ok(Self {
            station: Station {
                id: station.eva_nr.unwrap_or_default(),
                name: station.name.unwrap_or_default(),
                latitude: coordinates.latitude.unwrap_or_default(),
                longitude: coordinates.longitude.unwrap_or_default(),
            },
            platform,
            distance_from_start: meters_to_km(info.distance_from_start),
            distance_from_previous: meters_to_km(info.distance),
            passed: info.passed.unwrap_or(false),
            scheduled_arrival: epoch_millis(timetable.scheduled_arrival_time),
            actual_arrival: epoch_millis(timetable.actual_arrival_time),
            scheduled_departure: epoch_millis(timetable.scheduled_departure_time),
            actual_departure: epoch_millis(timetable.actual_departure_time),
        })
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.delay() {
            Some(delay) => write!(
                f,
                "{} P:{} ({}m delay)",
                self.station,
                self.platform,
                delay.num_minutes()
            ),
            None => write!(f, "{} P:{} (unknown delay)", self.station, self.platform),
        }
    }
}

/// Duration from `from` to `to`, unless either side is the zero timestamp
fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Option<Duration> {
    if is_epoch(&from) || is_epoch(&to) {
        return None;
    }
    Some(to - from)
}

fn meters_to_km(meters: Option<f64>) -> f64 {
    meters.unwrap_or_default() / 1000.0
}

/// One trip as reported by the portal. Rebuilt from scratch on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub train_id: String,
    pub train_type: String,
    pub date: NaiveDate,
    pub distance_from_last_stop: f64,
    pub total_distance: f64,
    pub stops: Vec<Stop>,
    next_stop: Option<usize>,
    previous_stop: Option<usize>,
}

impl Trip {
    /// Decode a tripInfo body, either bare or wrapped in `{"trip": ...}`
    pub fn from_json(body: &str) -> Result<Self, DecodeError> {
        let mut value: Value = serde_json::from_str(body)?;
        let wire: WireTrip = if value.get("trip").is_some() {
            serde_json::from_value(value["trip"].take())?
        } else {
            serde_json::from_value(value)?
        };
        Self::from_wire(wire)
    }

    fn from_wire(wire: WireTrip) -> Result<Self, DecodeError> {
        let stops = wire
            .stops
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, s)| Stop::from_wire(i, s))
            .collect::<Result<Vec<_>, _>>()?;

        if stops.is_empty() {
            return Err(DecodeError::NoStops);
        }
        for (i, pair) in stops.windows(2).enumerate() {
            if pair[1].distance_from_start < pair[0].distance_from_start {
                return Err(DecodeError::UnorderedStops {
                    index: i + 1,
                    station: pair[1].station.name.clone(),
                });
            }
        }

        let stop_info = wire.stop_info.unwrap_or_default();
        let next_stop = position_of(&stops, stop_info.actual_next.as_deref());
        let previous_stop = position_of(&stops, stop_info.actual_last.as_deref());

        let date = wire
            .trip_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_default();

        Ok(Self {
            train_id: wire.vzn.unwrap_or_default(),
            train_type: wire.train_type.unwrap_or_default(),
            date,
            distance_from_last_stop: meters_to_km(wire.distance_from_last_stop),
            total_distance: meters_to_km(wire.total_distance),
            stops,
            next_stop,
            previous_stop,
        })
    }

    /// The stop the train is heading to; `None` once the trip is complete
    pub fn next_stop(&self) -> Option<&Stop> {
        self.next_stop.map(|i| &self.stops[i])
    }

    /// The stop the train departed from last
    pub fn previous_stop(&self) -> Option<&Stop> {
        self.previous_stop.map(|i| &self.stops[i])
    }

    pub fn final_stop(&self) -> &Stop {
        // non-empty, checked in from_wire
        &self.stops[self.stops.len() - 1]
    }

    /// Kilometers travelled since the first stop
    pub fn distance_from_start(&self) -> f64 {
        match self.previous_stop() {
            Some(prev) => prev.distance_from_start + self.distance_from_last_stop,
            None => self.distance_from_last_stop,
        }
    }

    /// Kilometers from the current position to `stop`. Negative for stops behind the train.
    pub fn distance_to(&self, stop: &Stop) -> f64 {
        stop.distance_from_start - self.distance_from_start()
    }

    /// First stop whose station name contains `name`, so "Basel" finds "Basel Bad Bf"
    pub fn find_stop(&self, name: &str) -> Option<&Stop> {
        self.stops.iter().find(|s| s.station.name.contains(name))
    }

    pub fn station_names(&self) -> Vec<String> {
        self.stops.iter().map(|s| s.station.name.clone()).collect()
    }
}

fn position_of(stops: &[Stop], station_id: Option<&str>) -> Option<usize> {
    let id = station_id.filter(|id| !id.is_empty())?;
    stops.iter().position(|s| s.station.id == id)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTrip {
    vzn: Option<String>,
    train_type: Option<String>,
    trip_date: Option<String>,
    distance_from_last_stop: Option<f64>,
    total_distance: Option<f64>,
    stop_info: Option<WireStopInfo>,
    stops: Option<Vec<WireStop>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStopInfo {
    actual_next: Option<String>,
    actual_last: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireStop {
    station: Option<WireStation>,
    track: Option<WireTrack>,
    info: Option<WireStopProgress>,
    timetable: Option<WireTimetable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStation {
    eva_nr: Option<String>,
    name: Option<String>,
    geocoordinates: Option<WireCoordinates>,
}

#[derive(Debug, Default, Deserialize)]
struct WireCoordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct WireTrack {
    actual: Option<String>,
    scheduled: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStopProgress {
    distance_from_start: Option<f64>,
    distance: Option<f64>,
    passed: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTimetable {
    scheduled_arrival_time: Option<i64>,
    actual_arrival_time: Option<i64>,
    scheduled_departure_time: Option<i64>,
    actual_departure_time: Option<i64>,
}
