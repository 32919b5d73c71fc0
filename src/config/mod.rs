/// Application configuration module
use crate::errors::{AppError, AppResult};
use crate::utils::parse_interval;
use clap::{Parser, ValueEnum};
use std::env;
use std::time::Duration;

/// Command line flags
#[derive(Parser, Debug)]
#[command(
    name = "icestat",
    version,
    about = "Live trip, speed and connectivity summary from inside an ICE train"
)]
pub struct Args {
    /// Interval in which to report statistics, e.g. "10s", "500ms", "2m"
    #[arg(long, default_value = "10s", value_parser = parse_interval)]
    pub interval: Duration,

    /// Number of iterations; 0 runs none, negative runs forever
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub count: i64,

    /// Optional destination to anticipate; matches part of the station name
    #[arg(long)]
    pub destination: Option<String>,

    /// Where the current speed is read from
    #[arg(long, value_enum, default_value_t = SpeedSource::Status)]
    pub speed_source: SpeedSource,

    /// Skip the upstream connectivity summary
    #[arg(long)]
    pub no_connectivity: bool,

    /// Verify TLS certificates (the portal serves a certificate for another host)
    #[arg(long)]
    pub verify_tls: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SpeedSource {
    /// Portal status endpoint, km/h
    Status,
    /// GPS position endpoint, m/s
    Position,
}

#[derive(Clone, Debug)]
pub struct Endpoints {
    pub trip_info_url: String,
    pub status_url: String,
    pub position_url: String,
    pub connectivity_url: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub interval: Duration,
    pub count: i64,
    pub destination: Option<String>,
    pub speed_source: SpeedSource,
    pub connectivity: bool,
    pub verify_tls: bool,
    pub http_timeout: Duration,
    pub endpoints: Endpoints,
}

impl AppConfig {
    /// Load configuration from the command line and environment variables
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> AppResult<Self> {
        let endpoints = Endpoints {
            trip_info_url: env_string(
                "TRIP_INFO_URL",
                "https://portal.imice.de/api1/rs/tripInfo",
            ),
            status_url: env_string("STATUS_URL", "http://ice.portal/jetty/api/v1/status"),
            position_url: env_string(
                "POSITION_URL",
                "http://www.ombord.info/api/jsonp/position/",
            ),
            connectivity_url: env_string(
                "CONNECTIVITY_URL",
                "http://www.ombord.info/api/jsonp/connectivity/",
            ),
        };

        let http_timeout = match env::var("HTTP_TIMEOUT_SECONDS") {
            Ok(s) => s
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    AppError::Config(format!("HTTP_TIMEOUT_SECONDS={:?} is not a positive integer", s))
                })?,
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self {
            interval: args.interval,
            count: args.count,
            destination: args.destination.filter(|d| !d.is_empty()),
            speed_source: args.speed_source,
            connectivity: !args.no_connectivity,
            verify_tls: args.verify_tls,
            http_timeout,
            endpoints,
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["icestat"]).unwrap();

        assert_eq!(args.interval, Duration::from_secs(10));
        assert_eq!(args.count, -1);
        assert_eq!(args.destination, None);
        assert_eq!(args.speed_source, SpeedSource::Status);
        assert!(!args.no_connectivity);
        assert!(!args.verify_tls);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "icestat",
            "--interval",
            "30s",
            "--count",
            "3",
            "--destination",
            "Basel",
            "--speed-source",
            "position",
            "--no-connectivity",
        ])
        .unwrap();

        assert_eq!(args.interval, Duration::from_secs(30));
        assert_eq!(args.count, 3);
        assert_eq!(args.destination.as_deref(), Some("Basel"));
        assert_eq!(args.speed_source, SpeedSource::Position);
        assert!(args.no_connectivity);
    }

    #[test]
    fn test_negative_count() {
        let args = Args::try_parse_from(["icestat", "--count", "-5"]).unwrap();
        assert_eq!(args.count, -5);
    }

    #[test]
    fn test_invalid_interval() {
        assert!(Args::try_parse_from(["icestat", "--interval", "often"]).is_err());
    }

    #[test]
    fn test_config_from_args() {
        let args = Args::try_parse_from(["icestat", "--destination", "", "--no-connectivity"])
            .unwrap();
        let config = AppConfig::from_args(args).unwrap();

        assert_eq!(config.destination, None);
        assert!(!config.connectivity);
        assert!(config.endpoints.trip_info_url.starts_with("http"));
    }
}
