//! Common types and traits for circuit devices and synthetic profiles.

use rand::{Rng, rngs::StdRng};

use crate::profile::ProfileSet;

/// Interval-specific inputs handed to devices when the circuit is solved.
/// # Fields
/// * `interval` - Solution interval index into the profiles
/// * `profiles` - Irradiance, temperature and loadshape series for the run
pub struct DeviceContext<'a> {
    pub interval: usize,
    pub profiles: &'a ProfileSet,
}

impl<'a> DeviceContext<'a> {
    /// Creates a context for the given interval.
    pub fn new(interval: usize, profiles: &'a ProfileSet) -> Self {
        Self { interval, profiles }
    }
}

/// Complex power drawn at a bus.
///
/// Load convention: positive values consume, negative values inject.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BusPower {
    pub kw: f64,
    pub kvar: f64,
}

impl BusPower {
    pub fn new(kw: f64, kvar: f64) -> Self {
        Self { kw, kvar }
    }
}

impl std::ops::AddAssign for BusPower {
    fn add_assign(&mut self, rhs: Self) {
        self.kw += rhs.kw;
        self.kvar += rhs.kvar;
    }
}

/// A circuit element that draws or injects power at one bus.
pub trait Device {
    /// Bus the device is connected to.
    fn bus(&self) -> &str;

    /// Power drawn at the bus for the interval in `context`.
    ///
    /// Positive values indicate consumption, negative values generation.
    fn power(&self, context: &DeviceContext<'_>) -> BusPower;
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Half-cosine daylight shape in `[0, 1]` for interval `t` within a day.
///
/// Zero outside `[sunrise_idx, sunset_idx)`, peaking midway between them.
pub fn daylight_frac(t: usize, steps_per_day: usize, sunrise_idx: usize, sunset_idx: usize) -> f64 {
    let tod = t % steps_per_day;
    if tod < sunrise_idx || tod >= sunset_idx {
        return 0.0;
    }
    let span = (sunset_idx - sunrise_idx) as f64;
    let x = (tod - sunrise_idx) as f64 / span;
    (std::f64::consts::PI * x).sin().max(0.0)
}
