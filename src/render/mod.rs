/// Terminal output for one tick
use crate::domain::{LinkSummary, Report, SpeedSummary, TripProgress};
use chrono::Duration;

const SIGNAL_BARS: [&str; 8] = ["█", "▇", "▆", "▅", "▄", "▃", "▂", "▁"];

// Lower bounds in dBm. These assume 3G/HSPA levels.
const SIGNAL_LOWER_BOUNDS: [f64; 7] = [-67.5, -75.0, -82.5, -90.0, -95.0, -100.0, -105.0];

/// Render the whole status line
pub fn summary_line(report: &Report) -> String {
    let mut line = trip_part(&report.trip);
    line.push_str(&speed_part(&report.speed));
    if let Some(links) = &report.links {
        line.push_str(&links_part(links));
    }
    line
}

fn trip_part(trip: &TripProgress) -> String {
    let dest = &trip.destination;
    match &trip.via {
        Some(via) => format!(
            "{} to {:?} (P:{}, via {:?}): distance={:.0}({:.0}) km, eta={}({}), delay={}({})",
            trip.train,
            dest.name,
            dest.platform,
            via.name,
            dest.distance_km,
            via.distance_km,
            format_duration(dest.eta),
            format_duration(via.eta),
            format_duration(dest.delay),
            format_duration(via.delay),
        ),
        None => format!(
            "{} to {:?} (P:{}): distance={:.0} km, eta={}, delay={}",
            trip.train,
            dest.name,
            dest.platform,
            dest.distance_km,
            format_duration(dest.eta),
            format_duration(dest.delay),
        ),
    }
}

fn speed_part(speed: &SpeedSummary) -> String {
    format!(
        ", speed={:.0}/{:.0}/{:.0}/{:.0} [km/h] (cur/avg/med/max)",
        speed.current, speed.average, speed.median, speed.max
    )
}

fn links_part(links: &LinkSummary) -> String {
    let state = if links.online { "online" } else { "offline" };
    let bars: String = links
        .signals
        .iter()
        .map(|s| s.map(signal_bar).unwrap_or(" "))
        .collect();

    format!(
        ", wifi={} [{}] ({}/{})",
        state,
        bars,
        links.links_up,
        links.signals.len()
    )
}

/// One block character for a signal strength
pub fn signal_bar(rssi: f64) -> &'static str {
    SIGNAL_LOWER_BOUNDS
        .iter()
        .position(|lb| rssi >= *lb)
        .map(|i| SIGNAL_BARS[i])
        .unwrap_or(SIGNAL_BARS[SIGNAL_BARS.len() - 1])
}

/// "H:MM", rounded to whole minutes
pub fn format_duration(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "?:??".to_string();
    };

    let minutes = (d.num_seconds() as f64 / 60.0).round() as i64;
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.abs();
    format!("{}{}:{:02}", sign, minutes / 60, minutes % 60)
}
