//! Weighted sampling with an injected random source.

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplingError {
    #[error("{options} options but {weights} weights")]
    LengthMismatch { options: usize, weights: usize },
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
}

impl From<WeightedError> for SamplingError {
    fn from(err: WeightedError) -> Self {
        SamplingError::InvalidWeights(err.to_string())
    }
}

/// Options paired with integer weights, validated once and sampled many times.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    options: Vec<T>,
    index: WeightedIndex<u32>,
}

impl<T> WeightedTable<T> {
    pub fn new(options: Vec<T>, weights: &[u32]) -> Result<Self, SamplingError> {
        if options.len() != weights.len() {
            return Err(SamplingError::LengthMismatch {
                options: options.len(),
                weights: weights.len(),
            });
        }
        let index = WeightedIndex::new(weights)?;
        Ok(Self { options, index })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        &self.options[self.index.sample(rng)]
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }
}

/// One-shot weighted pick. Prefer [`WeightedTable`] when sampling repeatedly.
pub fn weighted_choice<'a, T, R: Rng + ?Sized>(
    options: &'a [T],
    weights: &[u32],
    rng: &mut R,
) -> Result<&'a T, SamplingError> {
    if options.len() != weights.len() {
        return Err(SamplingError::LengthMismatch {
            options: options.len(),
            weights: weights.len(),
        });
    }
    let index = WeightedIndex::new(weights)?;
    Ok(&options[index.sample(rng)])
}
