//! Inverse-distance-weighted interpolation
//!
//! The estimate at a query point is the weighted average of all sample
//! values with weights `1 / max(floor, d)^power`. A query that falls within
//! `distance_floor` of one or more samples returns their exact (mean) value
//! instead, so the surface honours every station.

use crate::error::{RainmapError, Result};
use crate::types::StationObservation;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POWER: f64 = 2.0;
pub const DEFAULT_DISTANCE_FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdwParams {
    /// Distance decay exponent, must be > 0.
    pub power: f64,
    /// Minimum distance used in weighting, must be > 0.
    pub distance_floor: f64,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: DEFAULT_POWER,
            distance_floor: DEFAULT_DISTANCE_FLOOR,
        }
    }
}

impl IdwParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.power.is_finite() && self.power > 0.0) {
            return Err(RainmapError::InvalidParameter {
                name: "power",
                value: self.power,
            });
        }
        if !(self.distance_floor.is_finite() && self.distance_floor > 0.0) {
            return Err(RainmapError::InvalidParameter {
                name: "distance_floor",
                value: self.distance_floor,
            });
        }
        Ok(())
    }
}

/// Validated interpolator over a borrowed sample slice.
///
/// Construction checks the samples and parameters once, so per-cell
/// evaluation is infallible.
#[derive(Debug, Clone, Copy)]
pub struct IdwInterpolator<'a> {
    samples: &'a [StationObservation],
    params: IdwParams,
    min_value: f64,
    max_value: f64,
}

impl<'a> IdwInterpolator<'a> {
    pub fn new(samples: &'a [StationObservation], params: IdwParams) -> Result<Self> {
        if samples.is_empty() {
            return Err(RainmapError::EmptySampleSet);
        }
        params.validate()?;
        let (min_value, max_value) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.value), hi.max(s.value))
            });
        Ok(Self {
            samples,
            params,
            min_value,
            max_value,
        })
    }

    pub fn params(&self) -> &IdwParams {
        &self.params
    }

    pub fn estimate(&self, x: f64, y: f64) -> f64 {
        let floor = self.params.distance_floor;
        let power = self.params.power;

        let mut d_min = f64::INFINITY;
        let mut coincident_sum = 0.0;
        let mut coincident_count = 0usize;

        for s in self.samples {
            let d = (x - s.x()).hypot(y - s.y());
            if d <= floor {
                coincident_sum += s.value;
                coincident_count += 1;
            }
            d_min = d_min.min(d);
        }

        if coincident_count > 0 {
            return coincident_sum / coincident_count as f64;
        }

        // Weights scaled by d_min^power lie in (0, 1], with 1 for the nearest
        // sample. The quotient is unchanged.
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for s in self.samples {
            let d = (x - s.x()).hypot(y - s.y());
            let w = if d == d_min {
                1.0
            } else {
                let r = d_min / d;
                if power == 2.0 {
                    r * r
                } else {
                    r.powf(power)
                }
            };
            weighted_sum += w * s.value;
            weight_total += w;
        }

        self.clamp(weighted_sum / weight_total)
    }

    // Rounding in the weighted sum can push the quotient an ulp outside the
    // sample range.
    fn clamp(&self, value: f64) -> f64 {
        if self.min_value <= self.max_value {
            value.clamp(self.min_value, self.max_value)
        } else {
            value
        }
    }
}

/// One-shot IDW estimate at `(x, y)`.
pub fn estimate(samples: &[StationObservation], x: f64, y: f64, params: &IdwParams) -> Result<f64> {
    Ok(IdwInterpolator::new(samples, *params)?.estimate(x, y))
}
