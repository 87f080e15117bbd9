//! Firing delays. A [`Delay`] is a validated distribution over non-negative completion times.

use rand::prelude::*;
use rand_distr::{Exp1, StandardNormal};

/// Converts a uniform delay's spread into the half-width of its support. The spread is a
/// standard deviation, and a uniform distribution over `[m - h, m + h]` has standard deviation
/// `h / sqrt(3)`.
pub const UNIFORM_SPREAD_SCALE: f64 = 1.732_050_807_568_877_2;

/// The family a delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DelayKind {
    /// Always the mean.
    Deterministic,
    /// Uniform around the mean.
    Uniform,
    /// Gaussian around the mean.
    Normal,
    /// Exponential with the given mean.
    Exponential,
}

/// A firing delay distribution.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Delay {
    /// Fixed delay.
    Deterministic { mean: f64 },
    /// Uniform over `mean ± spread * UNIFORM_SPREAD_SCALE`.
    Uniform { mean: f64, spread: f64 },
    /// Gaussian with the given standard deviation.
    Normal { mean: f64, std_dev: f64 },
    /// Exponential with rate `1 / mean`.
    Exponential { mean: f64 },
}

impl Delay {
    /// Creates a fixed delay.
    pub fn deterministic(mean: f64) -> Result<Self, DelayError> {
        Self::new(DelayKind::Deterministic, mean, 0.0)
    }

    /// Creates a delay of the given kind. `spread` is ignored by deterministic and exponential
    /// delays, so it is only validated for the kinds that use it.
    pub fn new(kind: DelayKind, mean: f64, spread: f64) -> Result<Self, DelayError> {
        if !mean.is_finite() {
            return Err(DelayError::NotFinite(mean));
        }
        if mean < 0.0 {
            return Err(DelayError::NegativeMean(mean));
        }
        let checked_spread = || {
            if !spread.is_finite() {
                Err(DelayError::NotFinite(spread))
            } else if spread < 0.0 {
                Err(DelayError::NegativeSpread(spread))
            } else {
                Ok(spread)
            }
        };
        Ok(match kind {
            DelayKind::Deterministic => Self::Deterministic { mean },
            DelayKind::Uniform => {
                let spread = checked_spread()?;
                // The sampled range must stay finite at both ends
                let half = spread * UNIFORM_SPREAD_SCALE;
                if !(2.0 * half).is_finite() || !(mean + half).is_finite() {
                    return Err(DelayError::NotFinite(spread));
                }
                Self::Uniform { mean, spread }
            }
            DelayKind::Normal => Self::Normal {
                mean,
                std_dev: checked_spread()?,
            },
            DelayKind::Exponential => Self::Exponential { mean },
        })
    }

    pub fn kind(&self) -> DelayKind {
        match self {
            Self::Deterministic { .. } => DelayKind::Deterministic,
            Self::Uniform { .. } => DelayKind::Uniform,
            Self::Normal { .. } => DelayKind::Normal,
            Self::Exponential { .. } => DelayKind::Exponential,
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Self::Deterministic { mean }
            | Self::Uniform { mean, .. }
            | Self::Normal { mean, .. }
            | Self::Exponential { mean } => mean,
        }
    }

    /// The spread parameter, or zero for kinds that don't take one.
    pub fn spread(&self) -> f64 {
        match *self {
            Self::Uniform { spread, .. } => spread,
            Self::Normal { std_dev, .. } => std_dev,
            Self::Deterministic { .. } | Self::Exponential { .. } => 0.0,
        }
    }
}

impl Distribution<f64> for Delay {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let delay = match *self {
            Self::Deterministic { mean } => mean,
            Self::Uniform { mean, spread } => {
                let half = spread * UNIFORM_SPREAD_SCALE;
                rng.gen_range(mean - half..=mean + half)
            }
            Self::Normal { mean, std_dev } => {
                let z: f64 = rng.sample(StandardNormal);
                mean + std_dev * z
            }
            Self::Exponential { mean } => {
                let e: f64 = rng.sample(Exp1);
                mean * e
            }
        };
        delay.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum DelayError {
    #[error("delay mean must be non-negative (got {0})")]
    NegativeMean(f64),

    #[error("delay spread must be non-negative (got {0})")]
    NegativeSpread(f64),

    #[error("delay parameter {0} is not finite")]
    NotFinite(f64),
}
