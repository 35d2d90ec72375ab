use rand::{SeedableRng, rngs::StdRng};

use super::types::gaussian_noise;

/// Synthetic loadshape generator producing per-unit demand multipliers.
///
/// `LoadProfile` creates a sinusoidal daily pattern with configurable
/// baseline, amplitude, peak hour and Gaussian noise. It stands in for the
/// measured residential, commercial and industrial loadshapes when no CSV
/// is configured.
///
/// # Examples
///
/// ```
/// use feeder_gym::devices::baseload::LoadProfile;
///
/// let mut shape = LoadProfile::residential(96, 42);
/// let day = shape.generate(96);
/// assert_eq!(day.len(), 96);
/// assert!(day.iter().all(|m| *m >= 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct LoadProfile {
    /// Baseline multiplier
    pub base: f64,

    /// Amplitude of the sinusoidal variation
    pub amp: f64,

    /// Hour of day at which the sinusoid peaks
    pub peak_hour: f64,

    /// Standard deviation of the Gaussian noise
    pub noise_std: f64,

    /// Number of intervals per simulated day
    pub steps_per_day: usize,

    rng: StdRng,
}

impl LoadProfile {
    /// Creates a loadshape generator with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `base` - Baseline multiplier
    /// * `amp` - Amplitude of the daily variation
    /// * `peak_hour` - Hour of day (0-24) with the highest demand
    /// * `noise_std` - Standard deviation of Gaussian noise
    /// * `steps_per_day` - Number of intervals per simulated day
    /// * `seed` - Random seed for reproducible noise generation
    pub fn new(
        base: f64,
        amp: f64,
        peak_hour: f64,
        noise_std: f64,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base,
            amp,
            peak_hour,
            noise_std: noise_std.max(0.0),
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Evening-peaking household demand.
    pub fn residential(steps_per_day: usize, seed: u64) -> Self {
        Self::new(0.6, 0.3, 19.0, 0.03, steps_per_day, seed)
    }

    /// Business-hours demand peaking mid-afternoon.
    pub fn commercial(steps_per_day: usize, seed: u64) -> Self {
        Self::new(0.65, 0.3, 14.0, 0.03, steps_per_day, seed)
    }

    /// Near-flat process demand.
    pub fn industrial(steps_per_day: usize, seed: u64) -> Self {
        Self::new(0.85, 0.1, 12.0, 0.02, steps_per_day, seed)
    }

    /// Calculates the demand multiplier at a specific interval.
    ///
    /// The multiplier is guaranteed to be non-negative.
    pub fn multiplier(&mut self, t: usize) -> f64 {
        let day_pos = (t % self.steps_per_day) as f64 / self.steps_per_day as f64;
        let angle = 2.0 * std::f64::consts::PI * (day_pos - self.peak_hour / 24.0);
        let noise = gaussian_noise(&mut self.rng, self.noise_std);
        (self.base + self.amp * angle.cos() + noise).max(0.0)
    }

    /// Generates `n` consecutive multipliers starting at interval 0.
    pub fn generate(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|t| self.multiplier(t)).collect()
    }
}
