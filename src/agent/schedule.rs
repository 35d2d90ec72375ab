//! Value schedules driven by the remaining training progress.
//!
//! `progress_remaining` runs from 1 at the start of training to 0 at the
//! end.

/// `initial * progress_remaining`.
///
/// ```
/// use feeder_gym::agent::schedule::LinearSchedule;
///
/// let lr = LinearSchedule::new(0.001);
/// assert_eq!(lr.value(1.0), 0.001);
/// assert_eq!(lr.value(0.0), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSchedule {
    initial: f64,
}

impl LinearSchedule {
    pub fn new(initial: f64) -> Self {
        Self { initial }
    }

    pub fn value(&self, progress_remaining: f64) -> f64 {
        self.initial * progress_remaining.clamp(0.0, 1.0)
    }
}

/// Exploration rate falling linearly from `initial` to `final_value` over
/// the first `fraction` of training, then held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonSchedule {
    initial: f64,
    final_value: f64,
    fraction: f64,
}

impl EpsilonSchedule {
    pub fn new(initial: f64, final_value: f64, fraction: f64) -> Self {
        Self {
            initial,
            final_value,
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    pub fn value(&self, progress_remaining: f64) -> f64 {
        let progress = 1.0 - progress_remaining.clamp(0.0, 1.0);
        if self.fraction <= 0.0 || progress >= self.fraction {
            return self.final_value;
        }
        self.initial + (self.final_value - self.initial) * progress / self.fraction
    }
}
