//! Multiplicative surge pricing from time of day, weather and congestion.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use rand::Rng;
use ridestream_schema::tags;
use serde::{Deserialize, Serialize};

use crate::{round_to, CongestionClass, WeatherMode};

pub const DEFAULT_SURGE_CEILING: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgeConfig {
    pub ceiling: f64,
    pub rush_hour_probability: f64,
    pub weather_probability: f64,
    pub hot_zone_probability: f64,
    pub hot_zone_bump: f64,
    pub low_zone_discount: f64,
}

impl Default for SurgeConfig {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_SURGE_CEILING,
            rush_hour_probability: 0.15,
            weather_probability: 0.30,
            hot_zone_probability: 0.30,
            hot_zone_bump: 0.05,
            low_zone_discount: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurgeQuote {
    pub multiplier: f64,
    /// Reasons in evaluation order: rush hour, weather, hot zone.
    pub reasons: Vec<&'static str>,
}

pub fn is_rush_hour(at: &NaiveDateTime) -> bool {
    let weekday = !matches!(at.weekday(), Weekday::Sat | Weekday::Sun);
    let hour = at.hour();
    weekday && ((7..=9).contains(&hour) || (17..=19).contains(&hour))
}

#[derive(Debug, Clone, Default)]
pub struct SurgeModel {
    config: SurgeConfig,
}

impl SurgeModel {
    pub fn new(config: SurgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SurgeConfig {
        &self.config
    }

    pub fn quote<R: Rng + ?Sized>(
        &self,
        at: &NaiveDateTime,
        weather: WeatherMode,
        congestion: CongestionClass,
        rng: &mut R,
    ) -> SurgeQuote {
        let cfg = &self.config;
        let mut surge = 1.0;
        let mut reasons = Vec::new();

        if is_rush_hour(at) && rng.gen_bool(cfg.rush_hour_probability) {
            surge += rng.gen_range(0.3..=0.7);
            reasons.push(tags::RUSH_HOUR);
        }

        if weather.is_precipitating() && rng.gen_bool(cfg.weather_probability) {
            surge += rng.gen_range(0.2..=0.5);
            reasons.push(tags::WEATHER);
        }

        match congestion {
            CongestionClass::High => {
                if rng.gen_bool(cfg.hot_zone_probability) {
                    surge += rng.gen_range(0.2..=0.5);
                    reasons.push(tags::HOT_ZONE);
                } else {
                    surge += cfg.hot_zone_bump;
                }
            }
            CongestionClass::Low => surge *= cfg.low_zone_discount,
            CongestionClass::Medium => {}
        }

        surge *= rng.gen_range(0.98..=1.02);

        SurgeQuote {
            multiplier: round_to(surge, 2).clamp(1.0, cfg.ceiling.max(1.0)),
            reasons,
        }
    }
}
