use ridestream_schema::{TripRow, TIMESTAMP_FORMAT};
use serde::{Deserialize, Serialize};

use crate::AlertCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

const UNKNOWN: &str = "Unknown";
const NOT_AVAILABLE: &str = "N/A";

/// Builds the webhook body for one alert. Missing values become placeholders.
pub fn render(category: AlertCategory, row: &TripRow) -> WebhookPayload {
    let trigger = row.alert_trigger.as_deref().filter(|t| !t.is_empty()).unwrap_or("None");
    let surge = row.surge_multiplier.map_or_else(|| UNKNOWN.to_string(), |s| format!("x{s:?}"));
    let distance = row.distance.map_or_else(|| NOT_AVAILABLE.to_string(), |d| format!("{d:?}"));
    let short_id: String = row.ride_id.chars().take(8).collect();

    let embed = Embed {
        title: category.title().to_string(),
        description: format!("**Trigger:** `{trigger}`"),
        color: category.color(),
        fields: vec![
            EmbedField {
                name: "📍 Route".into(),
                value: format!(
                    "`{}` ➝ `{}`\n({distance} miles)",
                    or_unknown(&row.source),
                    or_unknown(&row.destination)
                ),
                inline: false,
            },
            EmbedField {
                name: "🚘 Trip Info".into(),
                value: format!(
                    "**Car:** {} ({})\n**Surge:** `{surge}` 📈",
                    or_unknown(&row.cab_type),
                    or_unknown(&row.name)
                ),
                inline: true,
            },
            EmbedField {
                name: "🌡️ Environment".into(),
                value: format!(
                    "**Temp:** {:?}°F\n**Precip:** {:?}",
                    row.temperature, row.precip_intensity
                ),
                inline: true,
            },
        ],
        footer: EmbedFooter {
            text: format!(
                "📅 {} | ID: {}",
                row.timestamp.format(TIMESTAMP_FORMAT),
                if short_id.is_empty() { NOT_AVAILABLE } else { short_id.as_str() }
            ),
        },
    };

    WebhookPayload { embeds: vec![embed] }
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        UNKNOWN
    } else {
        value
    }
}
