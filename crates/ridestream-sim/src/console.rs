//! Fixed-width per-tick table printed while the simulator runs.

use ridestream_schema::{TripEvent, TIMESTAMP_FORMAT};

use crate::Tick;

const W_TIME: usize = 19;
const W_WEATHER: usize = 11;
const W_SURGE: usize = 6;
const W_CAR: usize = 14;
const W_DIST: usize = 9;
const W_LOC: usize = 22;
const LINE_LEN: usize = 145;

pub fn header() -> String {
    let rule = "-".repeat(LINE_LEN);
    format!(
        "{rule}\n{:<W_TIME$} | {:<W_WEATHER$} | {:<W_SURGE$} | {:<W_CAR$} | {:<W_DIST$} | {:<W_LOC$} | {:<W_LOC$} | ALERTS\n{rule}",
        "TIMESTAMP", "WEATHER", "SURGE", "CAR TYPE", "DIST", "SOURCE", "DESTINATION",
    )
}

pub fn row(tick: &Tick) -> String {
    let time = tick.timestamp().format(TIMESTAMP_FORMAT).to_string();
    match tick {
        Tick::Malformed { .. } => format!("{time:<W_TIME$} | ☠️  SENT BAD JSON DATA (TESTING DLQ) ☠️"),
        Tick::Trip(event) => trip_row(&time, event),
    }
}

fn trip_row(time: &str, event: &TripEvent) -> String {
    let weather = weather_cell(event);
    let surge = event
        .surge_multiplier
        .map_or_else(|| "N/A".to_string(), |s| format!("x{s:.2}"));
    let dist = event
        .distance
        .map_or_else(|| "N/A".to_string(), |d| format!("{d:.2} mi"));
    let alerts = event
        .alert_trigger
        .as_ref()
        .and_then(|t| t.flatten())
        .unwrap_or_default();

    format!(
        "{time:<W_TIME$} | {weather} | {surge:<W_SURGE$} | {:<W_CAR$} | {dist:<W_DIST$} | {:<W_LOC$} | {:<W_LOC$} | {alerts}",
        event.name,
        truncate(&event.source, W_LOC),
        truncate(&event.destination, W_LOC),
    )
}

fn weather_cell(event: &TripEvent) -> String {
    // The weather column is icon + space + text; icons render two columns wide.
    let text_width = W_WEATHER - 2;
    if event.distance.is_none() {
        return format!("🚫 {:<text_width$}", "N/A");
    }
    let icon = weather_icon(event.temperature, event.precip_intensity);
    format!("{icon} {:<text_width$}", format!("{:.1}°F", event.temperature))
}

pub fn weather_icon(temperature: f64, precip_intensity: f64) -> &'static str {
    if precip_intensity > 0.0 && temperature <= 32.0 {
        "❄️"
    } else if precip_intensity > 0.0 {
        "🌧️"
    } else {
        "☀️"
    }
}

fn truncate(value: &str, width: usize) -> String {
    value.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ridestream_schema::AlertTrigger;

    fn event() -> TripEvent {
        TripEvent {
            ride_id: "d1c6a4f0-0000-4000-8000-000000000000".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(8, 15, 0)
                .unwrap(),
            source: "Northeastern University".into(),
            destination: "Back Bay".into(),
            cab_type: "Uber".into(),
            name: "Black SUV".into(),
            distance: Some(1.5),
            surge_multiplier: Some(1.234),
            temperature: 30.04,
            precip_intensity: 0.2,
            alert_trigger: AlertTrigger::from_tags(vec!["RUSH HOUR".into()]),
        }
    }

    #[test]
    fn icon_selection() {
        assert_eq!(weather_icon(30.0, 0.2), "❄️");
        assert_eq!(weather_icon(45.0, 0.7), "🌧️");
        assert_eq!(weather_icon(20.0, 0.0), "☀️");
    }

    #[test]
    fn trip_row_formats_each_column() {
        let line = row(&Tick::Trip(event()));
        assert!(line.starts_with("2024-03-04 08:15:00 | ❄️ 30.0°F"));
        assert!(line.contains("| x1.23  |"));
        assert!(line.contains("| 1.50 mi   |"));
        assert!(line.contains("| Northeastern Universit |"));
        assert!(line.ends_with("| RUSH HOUR"));
    }

    #[test]
    fn missing_data_row_shows_placeholders() {
        let mut event = event();
        event.distance = None;
        event.surge_multiplier = None;
        event.alert_trigger = None;
        let line = row(&Tick::Trip(event));
        assert!(line.contains("🚫 N/A"));
        assert!(line.contains("| N/A    |"));
        assert!(line.ends_with("| "));
    }

    #[test]
    fn malformed_row() {
        let tick = Tick::Malformed {
            at: event().timestamp,
            payload: Vec::new(),
        };
        assert!(row(&tick).contains("SENT BAD JSON DATA (TESTING DLQ)"));
    }

    #[test]
    fn header_has_rules() {
        let header = header();
        let lines: Vec<_> = header.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 145);
        assert!(lines[1].starts_with("TIMESTAMP"));
    }
}
