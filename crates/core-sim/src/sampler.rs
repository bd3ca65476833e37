use std::collections::{HashMap, VecDeque};

use rand::{rngs::StdRng, Rng, SeedableRng};
use strategy::RawRecord;

use crate::position::Position;

const DEFAULT_MIN_VARIATION: f64 = -0.025;
const DEFAULT_MAX_VARIATION: f64 = 0.035;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SamplerError {
    #[error("variation band must be finite, got [{min}, {max}]")]
    NonFiniteBand { min: f64, max: f64 },
    #[error("variation band must satisfy -1 < min <= max, got [{min}, {max}]")]
    InvalidBand { min: f64, max: f64 },
}

/// Yields a "current price" for an open position. All randomness in the
/// session lives behind this trait.
pub trait PriceSampler: Send {
    /// Called once per cycle with every record the feed returned.
    fn observe(&mut self, _records: &[RawRecord]) {}

    fn sample(&mut self, position: &Position) -> f64;
}

/// Moves the entry price by a uniform fractional variation.
#[derive(Debug, Clone)]
pub struct RandomWalkSampler {
    rng: StdRng,
    min_variation: f64,
    max_variation: f64,
}

impl RandomWalkSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            min_variation: DEFAULT_MIN_VARIATION,
            max_variation: DEFAULT_MAX_VARIATION,
        }
    }

    pub fn with_band(
        seed: u64,
        min_variation: f64,
        max_variation: f64,
    ) -> Result<Self, SamplerError> {
        if !min_variation.is_finite() || !max_variation.is_finite() {
            return Err(SamplerError::NonFiniteBand {
                min: min_variation,
                max: max_variation,
            });
        }
        if min_variation <= -1.0 || min_variation > max_variation {
            return Err(SamplerError::InvalidBand {
                min: min_variation,
                max: max_variation,
            });
        }

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            min_variation,
            max_variation,
        })
    }
}

impl PriceSampler for RandomWalkSampler {
    fn sample(&mut self, position: &Position) -> f64 {
        let variation = self
            .rng
            .gen_range(self.min_variation..=self.max_variation);
        position.entry_price * (1.0 + variation)
    }
}

/// Prices positions at the last quote the feed published for their symbol,
/// falling back to the entry price when the symbol has not been quoted.
#[derive(Debug, Clone, Default)]
pub struct FeedQuoteSampler {
    quotes: HashMap<String, f64>,
}

impl FeedQuoteSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quote(&self, symbol: &str) -> Option<f64> {
        self.quotes.get(symbol).copied()
    }
}

impl PriceSampler for FeedQuoteSampler {
    fn observe(&mut self, records: &[RawRecord]) {
        for record in records {
            let (Some(symbol), Some(price)) = (record.symbol.as_ref(), record.price) else {
                continue;
            };
            if price.is_finite() && price > 0.0 {
                self.quotes.insert(symbol.clone(), price);
            }
        }
    }

    fn sample(&mut self, position: &Position) -> f64 {
        self.quote(&position.symbol).unwrap_or(position.entry_price)
    }
}

/// Replays a fixed sequence of prices, then holds every position at entry.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    script: VecDeque<f64>,
}

impl ScriptedSampler {
    pub fn new(prices: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: prices.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl PriceSampler for ScriptedSampler {
    fn sample(&mut self, position: &Position) -> f64 {
        self.script.pop_front().unwrap_or(position.entry_price)
    }
}
