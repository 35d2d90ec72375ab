use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A piecewise-linear curve with clamped ends.
///
/// Evaluating below the first point returns the first `y`, above the last
/// point returns the last `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XyCurve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl XyCurve {
    /// Builds a curve from matching point arrays.
    ///
    /// # Errors
    ///
    /// Returns `Error::Profile` if the arrays are empty, differ in length,
    /// or `x` is not strictly increasing.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(Error::profile(
                "xycurve",
                format!("needs matching non-empty arrays, got {} x and {} y", x.len(), y.len()),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::profile("xycurve", "x values must be strictly increasing"));
        }
        Ok(Self { x, y })
    }

    /// Default PV power-temperature derating curve, 0 to 60 degrees C.
    pub fn pv_power_temperature() -> Self {
        Self {
            x: (0..=12).map(|i| f64::from(i) * 5.0).collect(),
            y: vec![
                0.82, 0.92, 0.97, 0.98, 0.99, 1.0, 0.99, 0.97, 0.89, 0.8, 0.75, 0.7, 0.65,
            ],
        }
    }

    /// Default inverter efficiency curve over per-unit DC power 0.1 to 1.0.
    pub fn pv_efficiency() -> Self {
        Self {
            x: (1..=10).map(|i| f64::from(i) / 10.0).collect(),
            y: vec![0.75, 0.78, 0.8, 0.83, 0.86, 0.89, 0.93, 0.95, 0.97, 0.99],
        }
    }

    /// Evaluates the curve at `at`.
    pub fn value(&self, at: f64) -> f64 {
        let last = self.x.len() - 1;
        if at <= self.x[0] {
            return self.y[0];
        }
        if at >= self.x[last] {
            return self.y[last];
        }
        // first index whose x exceeds `at`; always in 1..=last here
        let hi = self.x.partition_point(|&xi| xi <= at);
        let lo = hi - 1;
        let frac = (at - self.x[lo]) / (self.x[hi] - self.x[lo]);
        self.y[lo] + frac * (self.y[hi] - self.y[lo])
    }

    /// Number of points defining the curve.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
