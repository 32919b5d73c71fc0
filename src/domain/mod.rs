/// Domain models for the application
mod connectivity;
mod position;
mod speed;
mod status;
mod trip;

pub use connectivity::Connectivity;
pub use position::Position;
pub use speed::SpeedSampler;
pub use status::Status;
pub use trip::{Stop, Trip};

#[cfg(test)]
pub(crate) use trip::tests as trip_fixtures;

use chrono::Duration;

/// Values shown for one stop
#[derive(Debug, Clone, PartialEq)]
pub struct StopProgress {
    pub name: String,
    pub platform: String,
    pub distance_km: f64,
    pub eta: Option<Duration>,
    pub delay: Option<Duration>,
}

/// Where the train is heading
#[derive(Debug, Clone, PartialEq)]
pub struct TripProgress {
    /// Train type and number, e.g. "ICE521"
    pub train: String,
    pub destination: StopProgress,
    /// The next stop, when it is not the destination
    pub via: Option<StopProgress>,
}

/// Speed statistics in km/h
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedSummary {
    pub current: f64,
    pub average: f64,
    pub median: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkSummary {
    pub online: bool,
    /// RSSI per link, `None` for links that are down
    pub signals: Vec<Option<f64>>,
    pub links_up: usize,
}

/// Everything rendered for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub trip: TripProgress,
    pub speed: SpeedSummary,
    pub links: Option<LinkSummary>,
}
