/// How `solve` moves through time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    /// Every solve uses the current interval; time never advances on its own.
    Snapshot,
    /// Time-series mode; profiles are indexed by the interval counter.
    Daily,
}

/// Tracks the solution interval of a time-series run.
///
/// # Examples
///
/// ```
/// use feeder_gym::circuit::clock::{SolutionClock, SolveMode};
///
/// let mut clock = SolutionClock::new(15);
/// clock.set_mode(SolveMode::Daily);
/// clock.set_hour(1.0);
/// assert_eq!(clock.interval(), 4);
/// clock.tick();
/// assert_eq!(clock.interval(), 5);
/// assert!((clock.hour() - 1.25).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SolutionClock {
    mode: SolveMode,
    step_minutes: u32,
    /// Intervals processed by one `solve` in daily mode
    number: usize,
    interval: usize,
}

impl SolutionClock {
    /// Creates a snapshot-mode clock at interval 0.
    ///
    /// # Arguments
    ///
    /// * `step_minutes` - Interval length; zero is raised to one minute
    pub fn new(step_minutes: u32) -> Self {
        Self {
            mode: SolveMode::Snapshot,
            step_minutes: step_minutes.max(1),
            number: 1,
            interval: 0,
        }
    }

    /// Advances the clock by one interval in daily mode.
    ///
    /// # Returns
    ///
    /// The interval index after advancing. Snapshot mode leaves it unchanged.
    pub fn tick(&mut self) -> usize {
        if self.mode == SolveMode::Daily {
            self.interval += 1;
        }
        self.interval
    }

    /// Moves to the interval containing `hour`, rounded to the nearest interval.
    pub fn set_hour(&mut self, hour: f64) {
        let minutes = hour.max(0.0) * 60.0;
        self.interval = (minutes / f64::from(self.step_minutes)).round() as usize;
    }

    pub fn set_interval(&mut self, interval: usize) {
        self.interval = interval;
    }

    pub fn set_mode(&mut self, mode: SolveMode) {
        self.mode = mode;
    }

    pub fn set_step_minutes(&mut self, step_minutes: u32) {
        self.step_minutes = step_minutes.max(1);
    }

    pub fn set_number(&mut self, number: usize) {
        self.number = number.max(1);
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn hour(&self) -> f64 {
        self.interval as f64 * f64::from(self.step_minutes) / 60.0
    }

    pub fn mode(&self) -> SolveMode {
        self.mode
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    pub fn number(&self) -> usize {
        self.number
    }
}
