//! One trip record per tick, assembled from the weather, surge and distance models.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ridestream_schema::{tags, AlertTrigger, TripEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    DistanceSampler, RideOption, SamplingError, SimClock, SurgeConfig, SurgeModel, WeatherModel,
    WeatherState, WeightedTable, Zone, RIDE_OPTIONS, ZONES,
};

/// Bytes published when a tick deliberately emits a broken record.
pub const MALFORMED_PAYLOAD: &str = "☠️ THIS_IS_NOT_JSON_DATA ☠️";

pub const DEFAULT_DQ_MISSING_RATE: f64 = 0.02;
pub const DEFAULT_MALFORMED_RATE: f64 = 0.005;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub surge: SurgeConfig,
    pub dq_missing_rate: f64,
    pub malformed_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            surge: SurgeConfig::default(),
            dq_missing_rate: DEFAULT_DQ_MISSING_RATE,
            malformed_rate: DEFAULT_MALFORMED_RATE,
        }
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidFactor { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Trip(TripEvent),
    Malformed { at: NaiveDateTime, payload: Vec<u8> },
}

impl Tick {
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Tick::Trip(event) => event.timestamp,
            Tick::Malformed { at, .. } => *at,
        }
    }

    /// Bytes handed to the transport for this tick.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Tick::Trip(event) => event.encode(),
            Tick::Malformed { payload, .. } => payload.clone(),
        }
    }
}

pub struct EventGenerator<R = StdRng> {
    config: GeneratorConfig,
    clock: SimClock,
    rng: R,
    rides: WeightedTable<RideOption>,
    zones: WeightedTable<Zone>,
    weather: WeatherModel,
    surge: SurgeModel,
    distance: DistanceSampler,
}

impl EventGenerator<StdRng> {
    /// Seeded generators replay the same stream; unseeded ones draw from entropy.
    pub fn from_config(
        config: GeneratorConfig,
        clock: SimClock,
        seed: Option<u64>,
    ) -> Result<Self, GeneratorError> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, clock, rng)
    }
}

impl<R: Rng> EventGenerator<R> {
    pub fn new(config: GeneratorConfig, clock: SimClock, rng: R) -> Result<Self, GeneratorError> {
        check_rate("dq_missing_rate", config.dq_missing_rate)?;
        check_rate("malformed_rate", config.malformed_rate)?;
        check_surge(&config.surge)?;

        let ride_weights: Vec<u32> = RIDE_OPTIONS.iter().map(|r| r.weight).collect();
        let zone_weights: Vec<u32> = ZONES.iter().map(|z| z.weight).collect();
        Ok(Self {
            rides: WeightedTable::new(RIDE_OPTIONS.to_vec(), &ride_weights)?,
            zones: WeightedTable::new(ZONES.to_vec(), &zone_weights)?,
            weather: WeatherModel::new(),
            surge: SurgeModel::new(config.surge.clone()),
            distance: DistanceSampler::new()?,
            config,
            clock,
            rng,
        })
    }

    pub fn weather(&self) -> &WeatherState {
        self.weather.state()
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    pub fn tick(&mut self) -> Tick {
        let at = self.clock.advance(&mut self.rng).naive_local();

        let ride = *self.rides.sample(&mut self.rng);
        let source = *self.zones.sample(&mut self.rng);
        let mut destination = *self.zones.sample(&mut self.rng);
        while destination.name == source.name {
            destination = *self.zones.sample(&mut self.rng);
        }

        let reading = self.weather.step(at.hour(), &mut self.rng);
        let quote = self.surge.quote(&at, reading.mode, source.class, &mut self.rng);

        let mut dq_tags = Vec::new();
        let (distance, surge_multiplier) = if self.rng.gen_bool(self.config.dq_missing_rate) {
            dq_tags.push(tags::DQ_MISSING_DATA);
            (None, None)
        } else {
            let draw = self.distance.sample(&mut self.rng);
            dq_tags.extend(draw.flag);
            (Some(draw.miles), Some(quote.multiplier))
        };

        let trigger: Vec<String> = quote
            .reasons
            .iter()
            .chain(dq_tags.iter())
            .chain(reading.transition.iter())
            .map(|tag| tag.to_string())
            .collect();

        let ride_id = uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid();
        let event = TripEvent {
            ride_id: ride_id.to_string(),
            timestamp: at,
            source: source.name.to_string(),
            destination: destination.name.to_string(),
            cab_type: ride.cab_type.to_string(),
            name: ride.name.to_string(),
            distance,
            surge_multiplier,
            temperature: reading.temperature,
            precip_intensity: reading.precip_intensity,
            alert_trigger: AlertTrigger::from_tags(trigger),
        };

        if self.rng.gen_bool(self.config.malformed_rate) {
            return Tick::Malformed {
                at,
                payload: MALFORMED_PAYLOAD.as_bytes().to_vec(),
            };
        }
        Tick::Trip(event)
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), GeneratorError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GeneratorError::InvalidRate { name, value })
    }
}

fn check_surge(surge: &SurgeConfig) -> Result<(), GeneratorError> {
    check_rate("rush_hour_probability", surge.rush_hour_probability)?;
    check_rate("weather_probability", surge.weather_probability)?;
    check_rate("hot_zone_probability", surge.hot_zone_probability)?;
    if !surge.low_zone_discount.is_finite() || surge.low_zone_discount <= 0.0 {
        return Err(GeneratorError::InvalidFactor {
            name: "low_zone_discount",
            value: surge.low_zone_discount,
        });
    }
    Ok(())
}
