use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod tags;

/// Wire format of the simulated wall clock.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One ride-hailing trip as it travels from the generator to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripEvent {
    pub ride_id: String,
    #[serde(with = "sim_timestamp")]
    pub timestamp: NaiveDateTime,
    pub source: String,
    pub destination: String,
    pub cab_type: String,
    pub name: String,
    pub distance: Option<f64>,
    pub surge_multiplier: Option<f64>,
    pub temperature: f64,
    #[serde(rename = "precipIntensity")]
    pub precip_intensity: f64,
    /// Absent when no tags fired. Older producers send a joined string;
    /// falsy scalars read as absent and other scalars as their text.
    #[serde(
        default,
        deserialize_with = "lenient_trigger::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub alert_trigger: Option<AlertTrigger>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertTrigger {
    Tags(Vec<String>),
    Text(String),
}

impl AlertTrigger {
    /// Wraps generator tags; an empty list yields no trigger at all.
    pub fn from_tags(tags: Vec<String>) -> Option<Self> {
        if tags.is_empty() {
            None
        } else {
            Some(Self::Tags(tags))
        }
    }

    /// Collapses the trigger into the single delimited string used for storage.
    pub fn flatten(&self) -> Option<String> {
        let joined = match self {
            Self::Tags(tags) => tags.join(", "),
            Self::Text(text) => text.clone(),
        };
        if joined.trim().is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

#[derive(Debug, Error)]
#[error("malformed trip payload: {source}")]
pub struct DecodeError {
    #[from]
    source: serde_json::Error,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("source and destination are both {0}")]
    SameZone(String),
    #[error("distance and surge_multiplier must be present together")]
    UnpairedMetrics,
    #[error("distance must be positive, got {0}")]
    NonPositiveDistance(f64),
    #[error("surge_multiplier must be at least 1.0, got {0}")]
    SurgeBelowFloor(f64),
    #[error("precipIntensity must not be negative, got {0}")]
    NegativePrecipitation(f64),
}

impl TripEvent {
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn encode(&self) -> Vec<u8> {
        // Every field is a plain string, number or list; serialization cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source == self.destination {
            return Err(ValidationError::SameZone(self.source.clone()));
        }
        match (self.distance, self.surge_multiplier) {
            (Some(distance), Some(surge)) => {
                if distance <= 0.0 {
                    return Err(ValidationError::NonPositiveDistance(distance));
                }
                if surge < 1.0 {
                    return Err(ValidationError::SurgeBelowFloor(surge));
                }
            }
            (None, None) => {}
            _ => return Err(ValidationError::UnpairedMetrics),
        }
        if self.precip_intensity < 0.0 {
            return Err(ValidationError::NegativePrecipitation(self.precip_intensity));
        }
        Ok(())
    }
}

/// A trip in the shape it is persisted: tags flattened to one string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRow {
    pub ride_id: String,
    pub timestamp: NaiveDateTime,
    pub source: String,
    pub destination: String,
    pub cab_type: String,
    pub name: String,
    pub distance: Option<f64>,
    pub surge_multiplier: Option<f64>,
    pub temperature: f64,
    pub precip_intensity: f64,
    pub alert_trigger: Option<String>,
}

impl From<TripEvent> for TripRow {
    fn from(event: TripEvent) -> Self {
        let alert_trigger = event.alert_trigger.as_ref().and_then(AlertTrigger::flatten);
        Self {
            ride_id: event.ride_id,
            timestamp: event.timestamp,
            source: event.source,
            destination: event.destination,
            cab_type: event.cab_type,
            name: event.name,
            distance: event.distance,
            surge_multiplier: event.surge_multiplier,
            temperature: event.temperature,
            precip_intensity: event.precip_intensity,
            alert_trigger,
        }
    }
}

mod lenient_trigger {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::AlertTrigger;

    fn scalar_text(value: &Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text.clone()),
            Value::Bool(true) => Some("true".to_string()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<AlertTrigger>, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        match raw {
            Value::Array(items) => Ok(AlertTrigger::from_tags(
                items.iter().filter_map(scalar_text).collect(),
            )),
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Object(_) => Err(serde::de::Error::custom(
                "alert_trigger must be a string, a list or a scalar",
            )),
            scalar => Ok(scalar_text(&scalar)
                .filter(|text| !text.is_empty())
                .map(AlertTrigger::Text)),
        }
    }
}

mod sim_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
