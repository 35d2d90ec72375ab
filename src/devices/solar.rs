use crate::devices::types::{daylight_frac, gaussian_noise};
use rand::{SeedableRng, rngs::StdRng};

/// Minimum cloud multiplier (heavy overcast).
const MULTIPLIER_MIN: f64 = 0.2;
/// Maximum cloud multiplier.
const MULTIPLIER_MAX: f64 = 1.0;

/// Synthetic per-unit irradiance generator used when no measured PV profile is given.
///
/// Produces a half-cosine daylight shape scaled by an AR(1) cloud multiplier:
/// ```text
/// m(t) = alpha * m(t-1) + (1 - alpha) * (1 + epsilon(t))
/// ```
/// clamped to \[0.2, 1.0\], so the output stays in \[0, 1\].
#[derive(Debug, Clone)]
pub struct SolarProfile {
    /// Number of intervals per simulated day.
    steps_per_day: usize,

    /// Interval index when sunrise occurs (inclusive).
    pub sunrise_idx: usize,

    /// Interval index when sunset occurs (exclusive).
    pub sunset_idx: usize,

    /// AR(1) correlation coefficient (0.0 = uncorrelated, 1.0 = fully persistent).
    pub alpha: f64,

    /// Standard deviation of the AR(1) innovation noise.
    pub cloud_noise_std: f64,

    /// Current cloud multiplier state.
    multiplier: f64,

    rng: StdRng,
}

impl SolarProfile {
    /// Creates a generator with sunrise at 06:00 and sunset at 20:00.
    ///
    /// # Arguments
    ///
    /// * `steps_per_day` - Intervals per day (e.g. 96 for 15 minutes)
    /// * `alpha` - AR(1) correlation coefficient (typical: 0.8-0.95)
    /// * `cloud_noise_std` - Standard deviation of innovation noise
    /// * `seed` - Random seed for reproducible clouds
    ///
    /// # Panics
    ///
    /// Panics if `steps_per_day` is smaller than 24.
    pub fn new(steps_per_day: usize, alpha: f64, cloud_noise_std: f64, seed: u64) -> Self {
        assert!(steps_per_day >= 24, "steps_per_day must be >= 24");
        let per_hour = steps_per_day / 24;
        Self {
            steps_per_day,
            sunrise_idx: 6 * per_hour,
            sunset_idx: 20 * per_hour,
            alpha: alpha.clamp(0.0, 1.0),
            cloud_noise_std: cloud_noise_std.max(0.0),
            multiplier: 1.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn advance_multiplier(&mut self) -> f64 {
        let epsilon = gaussian_noise(&mut self.rng, self.cloud_noise_std);
        self.multiplier = self.alpha * self.multiplier + (1.0 - self.alpha) * (1.0 + epsilon);
        self.multiplier = self.multiplier.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
        self.multiplier
    }

    /// Irradiance for interval `t` in per unit of the peak.
    ///
    /// The cloud state advances on every call, night included.
    pub fn irradiance(&mut self, t: usize) -> f64 {
        let m = self.advance_multiplier();
        let frac = daylight_frac(t, self.steps_per_day, self.sunrise_idx, self.sunset_idx);
        frac * m
    }

    /// Generates `n` consecutive intervals starting at interval 0.
    pub fn generate(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|t| self.irradiance(t)).collect()
    }
}

/// Deterministic ambient temperature curve (degrees C).
///
/// Sinusoid with its minimum at 05:00 and maximum at 17:00.
#[derive(Debug, Clone, Copy)]
pub struct TemperatureProfile {
    pub mean_c: f64,
    pub swing_c: f64,
    steps_per_day: usize,
}

impl TemperatureProfile {
    pub fn new(mean_c: f64, swing_c: f64, steps_per_day: usize) -> Self {
        Self {
            mean_c,
            swing_c,
            steps_per_day: steps_per_day.max(1),
        }
    }

    pub fn temperature_c(&self, t: usize) -> f64 {
        let day_pos = (t % self.steps_per_day) as f64 / self.steps_per_day as f64;
        let angle = 2.0 * std::f64::consts::PI * (day_pos - 17.0 / 24.0);
        self.mean_c + self.swing_c * angle.cos()
    }

    pub fn generate(&self, n: usize) -> Vec<f64> {
        (0..n).map(|t| self.temperature_c(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_irradiance_at_night() {
        let mut pv = SolarProfile::new(96, 0.9, 0.2, 42);
        let day = pv.generate(96);
        assert_eq!(day[0], 0.0);
        assert_eq!(day[23], 0.0);
        assert_eq!(day[80], 0.0);
        assert_eq!(day[95], 0.0);
    }

    #[test]
    fn irradiance_stays_in_unit_interval() {
        let mut pv = SolarProfile::new(96, 0.8, 0.6, 3);
        for v in pv.generate(96 * 10) {
            assert!((0.0..=1.0).contains(&v), "irradiance out of range: {v}");
        }
    }

    #[test]
    fn midday_is_positive_even_under_clouds() {
        let mut pv = SolarProfile::new(24, 0.9, 0.5, 9);
        let day = pv.generate(24);
        for (t, v) in day.iter().enumerate().take(17).skip(9) {
            assert!(*v > 0.0, "expected daylight at t={t}");
        }
    }

    #[test]
    fn seed_determinism() {
        let mut a = SolarProfile::new(96, 0.9, 0.2, 42);
        let mut b = SolarProfile::new(96, 0.9, 0.2, 42);
        assert_eq!(a.generate(200), b.generate(200));
        let mut c = SolarProfile::new(96, 0.9, 0.2, 43);
        let mut a = SolarProfile::new(96, 0.9, 0.2, 42);
        assert_ne!(a.generate(96), c.generate(96));
    }

    #[test]
    #[should_panic]
    fn too_coarse_day_panics() {
        SolarProfile::new(12, 0.9, 0.2, 0);
    }

    #[test]
    fn temperature_peaks_in_afternoon() {
        let temp = TemperatureProfile::new(25.0, 8.0, 24);
        assert!((temp.temperature_c(17) - 33.0).abs() < 1e-9);
        assert!((temp.temperature_c(5) - 17.0).abs() < 1e-9);
        assert_eq!(temp.generate(48)[17], temp.generate(48)[41]);
    }
}
