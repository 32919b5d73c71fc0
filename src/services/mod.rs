/// Polling logic: fetch, sample, and derive what to show
use crate::clients::{OmbordClient, PortalClient};
use crate::config::{AppConfig, SpeedSource};
use crate::domain::{
    Connectivity, LinkSummary, Report, SpeedSampler, SpeedSummary, Stop, StopProgress, Trip,
    TripProgress,
};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

/// Anything that yields one report per tick
pub trait ReportSource {
    fn next_report(&mut self) -> impl Future<Output = AppResult<Report>>;
}

/// Trip monitor; owns the speed history for the whole run
pub struct MonitorService {
    portal: PortalClient,
    ombord: OmbordClient,
    speeds: SpeedSampler,
    destination: Option<String>,
    speed_source: SpeedSource,
    connectivity: bool,
}

impl MonitorService {
    pub fn new(portal: PortalClient, ombord: OmbordClient, config: &AppConfig) -> Self {
        Self {
            portal,
            ombord,
            speeds: SpeedSampler::new(),
            destination: config.destination.clone(),
            speed_source: config.speed_source,
            connectivity: config.connectivity,
        }
    }

    /// Fetch everything for one tick and build the report
    pub async fn poll(&mut self) -> AppResult<Report> {
        let (trip, speed, links) = tokio::join!(
            self.portal.fetch_trip(),
            self.fetch_speed(),
            self.fetch_connectivity()
        );

        self.build_report(&trip?, speed?, links.as_ref(), Utc::now())
    }

    async fn fetch_speed(&self) -> AppResult<f64> {
        let kmh = match self.speed_source {
            SpeedSource::Status => self.portal.fetch_status().await?.speed,
            SpeedSource::Position => self.ombord.fetch_position().await?.speed,
        };
        Ok(kmh)
    }

    /// Connectivity is optional; failures only drop it from the report
    async fn fetch_connectivity(&self) -> Option<Connectivity> {
        if !self.connectivity {
            return None;
        }
        match self.ombord.fetch_connectivity().await {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("connectivity unavailable: {}", e);
                None
            }
        }
    }

    /// Record the speed sample and derive the report. The sample is only
    /// recorded when the trip part succeeds.
    pub fn build_report(
        &mut self,
        trip: &Trip,
        current_speed: f64,
        links: Option<&Connectivity>,
        now: DateTime<Utc>,
    ) -> AppResult<Report> {
        let progress = trip_progress(trip, self.destination.as_deref(), now)?;

        self.speeds.add(current_speed);

        Ok(Report {
            trip: progress,
            speed: SpeedSummary {
                current: current_speed,
                average: self.speeds.average(),
                median: self.speeds.median(),
                max: self.speeds.max(),
            },
            links: links.map(link_summary),
        })
    }
}

impl ReportSource for MonitorService {
    fn next_report(&mut self) -> impl Future<Output = AppResult<Report>> {
        self.poll()
    }
}

/// Poll `source` until `count` ticks are used up or the trip is over.
/// A negative `count` polls forever. Failed ticks use up the count, are
/// logged and retried after one interval.
pub async fn run<S, F>(source: &mut S, interval: Duration, count: i64, mut emit: F)
where
    S: ReportSource,
    F: FnMut(&Report),
{
    let mut remaining = count;

    while remaining != 0 {
        if remaining > 0 {
            remaining -= 1;
        }

        let result = match timeout(interval, source.next_report()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(interval)),
        };

        match result {
            Ok(report) => emit(&report),
            Err(e) if e.is_terminal() => {
                info!("{}", e);
                break;
            }
            Err(e) => {
                error!("{}", e);
                sleep(interval).await;
                continue;
            }
        }

        if remaining != 0 {
            sleep(interval).await;
        }
    }
}

/// Destination and next stop of `trip`. `destination` is a station name
/// fragment; without it the final stop is used.
pub fn trip_progress(
    trip: &Trip,
    destination: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<TripProgress> {
    let final_stop = trip.final_stop();
    let next_stop = trip
        .next_stop()
        .ok_or_else(|| AppError::TripComplete(final_stop.to_string()))?;

    let destination_stop = match destination {
        Some(name) => trip
            .find_stop(name)
            .ok_or_else(|| AppError::DestinationNotFound {
                name: name.to_string(),
                valid: trip.station_names(),
            })?,
        None => final_stop,
    };

    if destination_stop.passed {
        return Err(AppError::DestinationPassed(destination_stop.to_string()));
    }

    let via = if std::ptr::eq(destination_stop, next_stop) {
        None
    } else {
        Some(stop_progress(trip, next_stop, now))
    };

    Ok(TripProgress {
        train: format!("{}{}", trip.train_type, trip.train_id),
        destination: stop_progress(trip, destination_stop, now),
        via,
    })
}

fn stop_progress(trip: &Trip, stop: &Stop, now: DateTime<Utc>) -> StopProgress {
    StopProgress {
        name: stop.station.name.clone(),
        platform: stop.platform.clone(),
        distance_km: trip.distance_to(stop),
        eta: stop.eta_at(now),
        delay: stop.delay(),
    }
}

pub fn link_summary(connectivity: &Connectivity) -> LinkSummary {
    LinkSummary {
        online: connectivity.online,
        signals: connectivity
            .links
            .iter()
            .map(|l| l.is_up().then_some(l.rssi))
            .collect(),
        links_up: connectivity.links_up(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpClient;
    use crate::config::Args;
    use crate::domain::trip_fixtures::TRIP_INFO;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, TimeZone};
    use clap::Parser;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    const INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);

    /// Replays canned results, then succeeds forever
    #[derive(Default)]
    struct Scripted {
        replies: VecDeque<AppResult<Report>>,
        stall: Option<std::time::Duration>,
        calls: usize,
    }

    impl Scripted {
        fn new(replies: Vec<AppResult<Report>>) -> Self {
            Self {
                replies: replies.into(),
                ..Default::default()
            }
        }
    }

    impl ReportSource for Scripted {
        fn next_report(&mut self) -> impl Future<Output = AppResult<Report>> {
            self.calls += 1;
            let reply = self.replies.pop_front().unwrap_or_else(|| Ok(report("ICE1")));
            let stall = self.stall;
            async move {
                if let Some(d) = stall {
                    sleep(d).await;
                }
                reply
            }
        }
    }

    fn report(train: &str) -> Report {
        let stop = StopProgress {
            name: "München Hbf".to_string(),
            platform: "26".to_string(),
            distance_km: 12.4,
            eta: None,
            delay: None,
        };
        Report {
            trip: TripProgress {
                train: train.to_string(),
                destination: stop,
                via: None,
            },
            speed: SpeedSummary {
                current: 0.0,
                average: 0.0,
                median: 0.0,
                max: 0.0,
            },
            links: None,
        }
    }

    async fn run_counting(source: &mut Scripted, count: i64) -> Vec<String> {
        let mut trains = Vec::new();
        run(source, INTERVAL, count, |r| trains.push(r.trip.train.clone())).await;
        trains
    }

    fn now() -> DateTime<Utc> {
        // Aug 2 2018, 07:00:00 UTC; München is due at 07:07:00
        Utc.timestamp_opt(1533193200, 0).unwrap()
    }

    fn service(flags: &[&str]) -> MonitorService {
        let args = Args::try_parse_from(std::iter::once("icestat").chain(flags.iter().copied()))
            .unwrap();
        let config = AppConfig::from_args(args).unwrap();
        let http = HttpClient::new(&config).unwrap();
        let endpoints = config.endpoints.clone();
        MonitorService::new(
            PortalClient::new(http.clone(), endpoints.trip_info_url, endpoints.status_url),
            OmbordClient::new(http, endpoints.position_url, endpoints.connectivity_url),
            &config,
        )
    }

    #[test]
    fn test_progress_to_final_stop() {
        let trip = Trip::from_json(TRIP_INFO).unwrap();
        let progress = trip_progress(&trip, None, now()).unwrap();

        assert_eq!(progress.train, "ICE521");
        assert_eq!(progress.destination.name, "München Hbf");
        assert_eq!(progress.destination.platform, "26");
        assert_abs_diff_eq!(progress.destination.distance_km, 12.401, epsilon = 0.001);
        assert_eq!(progress.destination.eta, Some(Duration::minutes(7)));
        assert_eq!(progress.destination.delay, Some(Duration::zero()));
        assert!(progress.via.is_none());
    }

    #[test]
    fn test_trip_complete() {
        let body = TRIP_INFO.replace("\"actualNext\": \"8000261_00\"", "\"actualNext\": \"\"");
        let trip = Trip::from_json(&body).unwrap();

        let err = trip_progress(&trip, None, now()).unwrap_err();
        assert!(err.is_terminal());
        assert_eq!(err.to_string(), "train arrived in München Hbf P:26 (0m delay)");
    }

    #[test]
    fn test_destination_not_found_lists_stations() {
        let trip = Trip::from_json(TRIP_INFO).unwrap();

        match trip_progress(&trip, Some("Basel"), now()).unwrap_err() {
            AppError::DestinationNotFound { name, valid } => {
                assert_eq!(name, "Basel");
                assert_eq!(valid.len(), 11);
                assert_eq!(valid[0], "Köln Hbf");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_destination_passed() {
        let trip = Trip::from_json(TRIP_INFO).unwrap();
        let err = trip_progress(&trip, Some("Würzburg"), now()).unwrap_err();
        assert!(matches!(err, AppError::DestinationPassed(_)));
    }

    #[test]
    fn test_report_accumulates_speed() {
        let trip = Trip::from_json(TRIP_INFO).unwrap();
        let mut service = service(&["--no-connectivity"]);

        service.build_report(&trip, 44.2, None, now()).unwrap();
        service.build_report(&trip, 10.0, None, now()).unwrap();
        let report = service.build_report(&trip, 80.0, None, now()).unwrap();

        assert_eq!(report.speed.current, 80.0);
        assert_eq!(report.speed.max, 80.0);
        assert_eq!(report.speed.median, 44.2);
        assert_abs_diff_eq!(report.speed.average, 44.7333, epsilon = 0.001);
        assert!(report.links.is_none());
    }

    #[test]
    fn test_failed_trip_does_not_record_speed() {
        let trip = Trip::from_json(TRIP_INFO).unwrap();
        let mut service = service(&["--destination", "Basel"]);

        assert!(service.build_report(&trip, 250.0, None, now()).is_err());
        assert!(service.speeds.is_empty());
    }

    #[test]
    fn test_link_summary() {
        let body = r#"({"online":"1","links":[
            {"index":"1","device_state":"up","link_state":"available","rssi":"-70"},
            {"index":"2","device_state":"down","link_state":"disconnected","rssi":"-60"}
        ]});"#;
        let summary = link_summary(&Connectivity::from_jsonp(body).unwrap());

        assert!(summary.online);
        assert_eq!(summary.signals, vec![Some(-70.0), None]);
        assert_eq!(summary.links_up, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_zero_count_never_polls() {
        let mut source = Scripted::default();
        let start = Instant::now();

        let trains = run_counting(&mut source, 0).await;

        assert!(trains.is_empty());
        assert_eq!(source.calls, 0);
        assert_eq!(start.elapsed(), std::time::Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_after_count_without_trailing_sleep() {
        let mut source = Scripted::new(vec![Ok(report("ICE1")), Ok(report("ICE2"))]);
        let start = Instant::now();

        let trains = run_counting(&mut source, 2).await;

        assert_eq!(trains, vec!["ICE1", "ICE2"]);
        assert_eq!(source.calls, 2);
        assert_eq!(start.elapsed(), INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ends_when_trip_complete() {
        let mut source = Scripted::new(vec![
            Ok(report("ICE1")),
            Err(AppError::TripComplete("München Hbf".to_string())),
            Ok(report("ICE3")),
        ]);

        let trains = run_counting(&mut source, -1).await;

        assert_eq!(trains, vec!["ICE1"]);
        assert_eq!(source.calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_after_failed_tick() {
        let mut source = Scripted::new(vec![
            Err(AppError::DestinationPassed("Würzburg Hbf".to_string())),
            Ok(report("ICE2")),
        ]);
        let start = Instant::now();

        let trains = run_counting(&mut source, 2).await;

        assert_eq!(trains, vec!["ICE2"]);
        assert_eq!(source.calls, 2);
        assert_eq!(start.elapsed(), INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out_slow_tick() {
        let mut source = Scripted {
            stall: Some(INTERVAL * 3),
            ..Default::default()
        };
        let start = Instant::now();

        let trains = run_counting(&mut source, 1).await;

        assert!(trains.is_empty());
        assert_eq!(source.calls, 1);
        // timeout, then one interval before the next attempt
        assert_eq!(start.elapsed(), INTERVAL * 2);
    }
}
