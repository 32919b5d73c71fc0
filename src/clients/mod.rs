/// On-board API clients module
use crate::config::AppConfig;
use crate::domain::{Connectivity, Position, Status, Trip};
use crate::errors::{AppError, AppResult};
use reqwest::Client;
use tracing::{debug, warn};

/// HTTP client wrapper with common configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        if !config.verify_tls {
            warn!("disabled TLS certificate verification");
        }

        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("icestat/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the body of a successful response
    pub async fn get_text(&self, url: &str) -> AppResult<String> {
        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            return Err(AppError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp.text().await?;
        debug!(url, bytes = body.len(), "fetched");
        Ok(body)
    }
}

/// ICE portal client (trip schedule and train status)
pub struct PortalClient {
    http_client: HttpClient,
    trip_info_url: String,
    status_url: String,
}

impl PortalClient {
    pub fn new(http_client: HttpClient, trip_info_url: String, status_url: String) -> Self {
        Self {
            http_client,
            trip_info_url,
            status_url,
        }
    }

    /// Fetch the current trip
    pub async fn fetch_trip(&self) -> AppResult<Trip> {
        let body = self.http_client.get_text(&self.trip_info_url).await?;
        let trip = Trip::from_json(&body)?;
        debug!(
            train = %format!("{}{}", trip.train_type, trip.train_id),
            date = %trip.date,
            total_km = trip.total_distance,
            stops = trip.stops.len(),
            "trip decoded"
        );
        Ok(trip)
    }

    /// Fetch speed and GPS status
    pub async fn fetch_status(&self) -> AppResult<Status> {
        let body = self.http_client.get_text(&self.status_url).await?;
        let status = Status::from_json(&body)?;
        debug!(
            speed = status.speed,
            latitude = status.latitude,
            longitude = status.longitude,
            service_level = %status.service_level,
            "status decoded"
        );
        Ok(status)
    }
}

/// On-board router client; both endpoints answer in JSONP
pub struct OmbordClient {
    http_client: HttpClient,
    position_url: String,
    connectivity_url: String,
}

impl OmbordClient {
    pub fn new(http_client: HttpClient, position_url: String, connectivity_url: String) -> Self {
        Self {
            http_client,
            position_url,
            connectivity_url,
        }
    }

    /// Fetch GPS position and speed
    pub async fn fetch_position(&self) -> AppResult<Position> {
        let body = self.http_client.get_text(&self.position_url).await?;
        let position = Position::from_jsonp(&body)?;
        debug!(
            speed = position.speed,
            satellites = position.satellites,
            time = %position.time,
            "position decoded"
        );
        Ok(position)
    }

    /// Fetch the state of the upstream internet links
    pub async fn fetch_connectivity(&self) -> AppResult<Connectivity> {
        let body = self.http_client.get_text(&self.connectivity_url).await?;
        let connectivity = Connectivity::from_jsonp(&body)?;
        for link in &connectivity.links {
            debug!(
                index = link.index,
                technology = %link.technology,
                operator = link.operator.as_deref().unwrap_or("-"),
                rssi = link.rssi,
                up = link.is_up(),
                "link"
            );
        }
        Ok(connectivity)
    }
}
