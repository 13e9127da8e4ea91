//! Trip distance drawn from an empirical histogram.

use rand::Rng;
use ridestream_schema::tags;

use crate::{round_to, SamplingError, WeightedTable};

pub const DISTANCE_BINS: &[(f64, f64)] = &[
    (0.02, 0.52),
    (0.52, 1.02),
    (1.02, 1.52),
    (1.52, 2.02),
    (2.02, 2.52),
    (2.52, 3.02),
    (3.02, 3.52),
    (3.52, 4.02),
    (4.02, 4.52),
    (4.52, 5.02),
    (5.02, 5.52),
    (5.52, 6.02),
    (6.02, 6.52),
    (6.52, 7.02),
    (7.02, 7.52),
    (7.52, 8.02),
];

pub const DISTANCE_WEIGHTS: &[u32] = &[
    15078, 69131, 139591, 76602, 96347, 100281, 87828, 7758, 19926, 15372, 3732, 3066, 1116, 330,
    1806, 12,
];

pub const SHORT_TRIP_MILES: f64 = 0.2;
pub const LONG_TRIP_MILES: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceDraw {
    pub miles: f64,
    pub flag: Option<&'static str>,
}

pub fn classify_distance(miles: f64) -> Option<&'static str> {
    if miles <= SHORT_TRIP_MILES {
        Some(tags::DQ_SHORT)
    } else if miles >= LONG_TRIP_MILES {
        Some(tags::LONG)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct DistanceSampler {
    bins: WeightedTable<(f64, f64)>,
}

impl DistanceSampler {
    pub fn new() -> Result<Self, SamplingError> {
        Self::from_histogram(DISTANCE_BINS, DISTANCE_WEIGHTS)
    }

    pub fn from_histogram(bins: &[(f64, f64)], weights: &[u32]) -> Result<Self, SamplingError> {
        if let Some((low, high)) = bins.iter().find(|(low, high)| low >= high || *low <= 0.0) {
            return Err(SamplingError::InvalidWeights(format!(
                "bin ({low}, {high}) is not a positive interval"
            )));
        }
        Ok(Self {
            bins: WeightedTable::new(bins.to_vec(), weights)?,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DistanceDraw {
        let (low, high) = *self.bins.sample(rng);
        let miles = round_to(rng.gen_range(low..=high), 2);
        DistanceDraw {
            miles,
            flag: classify_distance(miles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn classification_thresholds() {
        assert_eq!(classify_distance(0.2), Some(tags::DQ_SHORT));
        assert_eq!(classify_distance(0.21), None);
        assert_eq!(classify_distance(5.99), None);
        assert_eq!(classify_distance(6.0), Some(tags::LONG));
    }

    #[test]
    fn histogram_tables_line_up() {
        assert_eq!(DISTANCE_BINS.len(), DISTANCE_WEIGHTS.len());
        assert!(DistanceSampler::new().is_ok());
    }

    #[test]
    fn rejects_inverted_bins() {
        let err = DistanceSampler::from_histogram(&[(1.0, 0.5)], &[1]).unwrap_err();
        assert!(matches!(err, SamplingError::InvalidWeights(_)));
    }

    #[test]
    fn lowest_draw_is_flagged_short() {
        let sampler = DistanceSampler::new().unwrap();
        let draw = sampler.sample(&mut StepRng::new(0, 0));
        assert_eq!(draw.miles, 0.02);
        assert_eq!(draw.flag, Some(tags::DQ_SHORT));
    }

    #[test]
    fn draws_stay_inside_histogram_and_round_to_cents() {
        let sampler = DistanceSampler::new().unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..5_000 {
            let draw = sampler.sample(&mut rng);
            assert!((0.02..=8.02).contains(&draw.miles));
            assert!((draw.miles * 100.0 - (draw.miles * 100.0).round()).abs() < 1e-9);
            assert_eq!(draw.flag, classify_distance(draw.miles));
        }
    }

    #[test]
    fn mass_concentrates_in_short_urban_trips() {
        let sampler = DistanceSampler::new().unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let n = 10_000;
        let under_four = (0..n).filter(|_| sampler.sample(&mut rng).miles < 4.02).count();
        assert!(under_four as f64 / n as f64 > 0.85);
    }
}
