//! Weather state machine driving temperature and precipitation.
//!
//! A mode is drawn only when the remaining duration has run out; while it
//! lasts the mode is held and no transition tag is emitted. Temperature
//! relaxes toward a mode-dependent target by a fixed fraction every tick.

use rand::Rng;
use ridestream_schema::tags;
use serde::Serialize;

use crate::round_to;

pub const INITIAL_TEMPERATURE: f64 = 42.0;
pub const RELAXATION_FACTOR: f64 = 0.05;
pub const TEMPERATURE_NOISE: f64 = 0.1;

const RAIN_THRESHOLD: f64 = 0.20;
const FREEZE_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeatherMode {
    Clear,
    Rain,
    Freeze,
}

impl WeatherMode {
    pub fn is_precipitating(self) -> bool {
        matches!(self, WeatherMode::Rain | WeatherMode::Freeze)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherState {
    pub mode: WeatherMode,
    pub remaining_ticks: u32,
    pub temperature: f64,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self {
            mode: WeatherMode::Clear,
            remaining_ticks: 0,
            temperature: INITIAL_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub mode: WeatherMode,
    pub temperature: f64,
    pub precip_intensity: f64,
    pub transition: Option<&'static str>,
}

pub fn is_daytime(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

pub fn target_temperature(mode: WeatherMode, hour: u32) -> f64 {
    let base = if is_daytime(hour) { 55.0 } else { 40.0 };
    match mode {
        WeatherMode::Clear => base,
        WeatherMode::Rain => base - 5.0,
        WeatherMode::Freeze => 25.0,
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeatherModel {
    state: WeatherState,
}

impl WeatherModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: WeatherState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &WeatherState {
        &self.state
    }

    /// Advances one tick at the given simulated hour.
    pub fn step<R: Rng + ?Sized>(&mut self, hour: u32, rng: &mut R) -> WeatherReading {
        let transition = if self.state.remaining_ticks > 0 {
            self.state.remaining_ticks -= 1;
            None
        } else {
            self.draw_mode(rng)
        };

        let precip_intensity = match self.state.mode {
            WeatherMode::Clear => 0.0,
            WeatherMode::Rain => round_to(rng.gen_range(0.5..=1.0), 2),
            WeatherMode::Freeze => round_to(rng.gen_range(0.1..=0.3), 2),
        };

        let target = target_temperature(self.state.mode, hour);
        let noise = rng.gen_range(-TEMPERATURE_NOISE..=TEMPERATURE_NOISE);
        let current = self.state.temperature;
        self.state.temperature = round_to(current + (target - current) * RELAXATION_FACTOR + noise, 1);

        WeatherReading {
            mode: self.state.mode,
            temperature: self.state.temperature,
            precip_intensity,
            transition,
        }
    }

    fn draw_mode<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&'static str> {
        let roll: f64 = rng.gen();
        let (mode, duration, tag) = if roll < RAIN_THRESHOLD {
            (WeatherMode::Rain, rng.gen_range(15..=30), Some(tags::STORM_STARTED))
        } else if roll < FREEZE_THRESHOLD {
            (WeatherMode::Freeze, rng.gen_range(15..=30), Some(tags::FREEZE_STARTED))
        } else {
            (WeatherMode::Clear, rng.gen_range(20..=50), None)
        };
        self.state.mode = mode;
        self.state.remaining_ticks = duration;
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn targets_follow_mode_and_daylight() {
        assert_eq!(target_temperature(WeatherMode::Clear, 12), 55.0);
        assert_eq!(target_temperature(WeatherMode::Clear, 23), 40.0);
        assert_eq!(target_temperature(WeatherMode::Rain, 6), 50.0);
        assert_eq!(target_temperature(WeatherMode::Rain, 5), 35.0);
        assert_eq!(target_temperature(WeatherMode::Freeze, 12), 25.0);
    }

    #[test]
    fn low_roll_starts_a_storm() {
        // An all-zero source draws 0.0 for the mode roll and the lower
        // bound of every range.
        let mut rng = StepRng::new(0, 0);
        let mut model = WeatherModel::new();

        let reading = model.step(12, &mut rng);
        assert_eq!(reading.mode, WeatherMode::Rain);
        assert_eq!(reading.transition, Some(tags::STORM_STARTED));
        assert_eq!(reading.precip_intensity, 0.5);
        assert_eq!(model.state().remaining_ticks, 15);
    }

    #[test]
    fn active_mode_counts_down_without_new_tags() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = WeatherModel::with_state(WeatherState {
            mode: WeatherMode::Freeze,
            remaining_ticks: 3,
            temperature: 30.0,
        });

        for expected_remaining in [2, 1, 0] {
            let reading = model.step(12, &mut rng);
            assert_eq!(reading.mode, WeatherMode::Freeze);
            assert_eq!(reading.transition, None);
            assert!((0.1..=0.3).contains(&reading.precip_intensity));
            assert_eq!(model.state().remaining_ticks, expected_remaining);
        }
    }

    #[test]
    fn temperature_relaxes_instead_of_snapping() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut model = WeatherModel::with_state(WeatherState {
            mode: WeatherMode::Freeze,
            remaining_ticks: 1_000,
            temperature: 55.0,
        });

        let first = model.step(12, &mut rng).temperature;
        // One tick closes about 5% of the 30 degree gap, never all of it.
        assert!(first < 55.0 && first > 52.0, "first step landed at {first}");

        let mut last = first;
        for _ in 0..300 {
            last = model.step(12, &mut rng).temperature;
        }
        assert!((last - 25.0).abs() < 1.5, "settled at {last}");
    }

    #[test]
    fn clear_weather_is_dry() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut model = WeatherModel::with_state(WeatherState {
            mode: WeatherMode::Clear,
            remaining_ticks: 10,
            temperature: 50.0,
        });
        for _ in 0..10 {
            assert_eq!(model.step(3, &mut rng).precip_intensity, 0.0);
        }
    }

    #[test]
    fn transition_frequencies_are_plausible() {
        let mut rng = StdRng::seed_from_u64(99);
        let (mut storms, mut freezes, mut draws) = (0, 0, 0);
        for _ in 0..20_000 {
            let mut model = WeatherModel::new();
            match model.step(12, &mut rng).transition {
                Some(tags::STORM_STARTED) => storms += 1,
                Some(tags::FREEZE_STARTED) => freezes += 1,
                _ => {}
            }
            draws += 1;
        }
        let storm_rate = storms as f64 / draws as f64;
        let freeze_rate = freezes as f64 / draws as f64;
        assert!((0.18..0.22).contains(&storm_rate), "storm rate {storm_rate}");
        assert!((0.04..0.06).contains(&freeze_rate), "freeze rate {freeze_rate}");
    }
}
