use ridestream_schema::{tags, TripRow};
use serde::{Deserialize, Serialize};

pub const SURGE_ALERT_THRESHOLD: f64 = 2.0;

/// Alert kinds, declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCategory {
    FreezeWeather,
    StormWeather,
    DataQuality,
    HighSurge,
}

impl AlertCategory {
    pub fn color(self) -> u32 {
        match self {
            Self::FreezeWeather => 3447003,
            Self::StormWeather => 15105570,
            Self::DataQuality => 16776960,
            Self::HighSurge => 15158332,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::FreezeWeather => "❄️ WEATHER ALERT: FREEZING",
            Self::StormWeather => "⛈️ WEATHER ALERT: STORM",
            Self::DataQuality => "🚫 DATA QUALITY ISSUE",
            Self::HighSurge => "🚨 HIGH SURGE DETECTED",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FreezeWeather => "FREEZE_WEATHER",
            Self::StormWeather => "STORM_WEATHER",
            Self::DataQuality => "DATA_QUALITY",
            Self::HighSurge => "HIGH_SURGE",
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker substrings checked in order; the first present one decides the category.
const DECISION_TABLE: &[(&str, AlertCategory)] = &[
    (tags::MARKER_FREEZE, AlertCategory::FreezeWeather),
    (tags::MARKER_STORM, AlertCategory::StormWeather),
    (tags::MARKER_DQ, AlertCategory::DataQuality),
];

pub fn should_alert(row: &TripRow) -> bool {
    if row.surge_multiplier.is_some_and(|s| s >= SURGE_ALERT_THRESHOLD) {
        return true;
    }
    row.alert_trigger
        .as_deref()
        .is_some_and(|t| DECISION_TABLE.iter().any(|(marker, _)| t.contains(marker)))
}

pub fn classify(alert_trigger: Option<&str>) -> AlertCategory {
    let trigger = alert_trigger.unwrap_or_default();
    DECISION_TABLE
        .iter()
        .find(|(marker, _)| trigger.contains(marker))
        .map(|(_, category)| *category)
        .unwrap_or(AlertCategory::HighSurge)
}

/// The category to raise for a stored row, if any.
pub fn evaluate(row: &TripRow) -> Option<AlertCategory> {
    should_alert(row).then(|| classify(row.alert_trigger.as_deref()))
}
