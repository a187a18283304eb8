//! Shared tuning primitives: randomized interval ranges and validation.
//!
//! Every tunable struct in this crate derives `Serialize`/`Deserialize` and
//! implements `Default`, so a tuning file only needs the fields it overrides.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A closed `[min, max]` range sampled uniformly.
///
/// An inverted range is treated as its ordered counterpart, a non-finite
/// bound is read as 0 and huge bounds are clamped, so malformed tuning
/// degrades instead of failing at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalRange {
    pub min: f32,
    pub max: f32,
}

impl IntervalRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Sanitized bounds in ascending order.
    pub fn ordered(&self) -> (f32, f32) {
        let (min, max) = (sane_bound(self.min), sane_bound(self.max));
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }

    /// Lower bound after ordering.
    pub fn low(&self) -> f32 {
        self.ordered().0
    }

    /// Upper bound after ordering.
    pub fn high(&self) -> f32 {
        self.ordered().1
    }

    pub fn contains(&self, value: f32) -> bool {
        let (lo, hi) = self.ordered();
        value >= lo && value <= hi
    }

    /// Uniform sample in the range. A zero-width range returns its bound.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = self.ordered();
        if hi - lo <= f32::EPSILON {
            lo
        } else {
            rng.gen_range(lo..=hi)
        }
    }
}

/// Largest magnitude a sampled bound may have; wider spans overflow the sampler.
const BOUND_LIMIT: f32 = 1.0e30;

fn sane_bound(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-BOUND_LIMIT, BOUND_LIMIT)
    } else {
        0.0
    }
}

/// Uniform sample in `[-extent, extent]`. Non-positive or non-finite extents
/// yield 0.
pub fn sample_symmetric<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    let extent = sane_bound(extent);
    if extent <= 0.0 {
        0.0
    } else {
        rng.gen_range(-extent..=extent)
    }
}

/// A rejected tuning value.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningError {
    pub field: &'static str,
    pub reason: String,
}

impl TuningError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for TuningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid tuning `{}`: {}", self.field, self.reason)
    }
}

impl std::error::Error for TuningError {}

/// Reject negative or non-finite scalars.
pub fn require_non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if !value.is_finite() {
        return Err(TuningError::new(field, format!("{} is not finite", value)));
    }
    if value < 0.0 {
        return Err(TuningError::new(field, format!("{} is negative", value)));
    }
    Ok(())
}

/// Reject ranges with negative or non-finite bounds. Inverted order is allowed.
pub fn require_non_negative_range(
    field: &'static str,
    range: &IntervalRange,
) -> Result<(), TuningError> {
    require_non_negative(field, range.min)?;
    require_non_negative(field, range.max)
}

/// Reject probabilities outside [0, 1].
pub fn require_probability(field: &'static str, value: f32) -> Result<(), TuningError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TuningError::new(
            field,
            format!("{} is not a probability", value),
        ));
    }
    Ok(())
}
