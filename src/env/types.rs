//! Interface shared by the episode environments.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::episode::EpisodeState;
use super::reward::RewardBreakdown;

/// One agent decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Discrete(usize),
    Continuous(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSpace {
    /// Actions `0..n`.
    Discrete(usize),
    /// A scalar in `[low, high]`.
    Continuous { low: f64, high: f64 },
}

impl ActionSpace {
    pub fn contains(&self, action: &Action) -> bool {
        match (self, action) {
            (Self::Discrete(n), Action::Discrete(a)) => a < n,
            (Self::Continuous { low, high }, Action::Continuous(a)) => (*low..=*high).contains(a),
            _ => false,
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Action {
        match *self {
            Self::Discrete(n) => Action::Discrete(rng.random_range(0..n.max(1))),
            Self::Continuous { low, high } => Action::Continuous(rng.random_range(low..=high)),
        }
    }
}

/// Box bounds of the observation vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSpace {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl ObservationSpace {
    pub fn uniform(dim: usize, low: f64, high: f64) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }
}

/// Side information returned with each observation. Fields an environment
/// does not measure stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Info {
    /// Profile interval that was solved.
    pub interval: Option<usize>,
    pub voltage_pu: Option<f64>,
    /// PV active power on its own kVA base, rounded.
    pub p_pu: Option<f64>,
    /// PV reactive power on its own kVA base, rounded.
    pub q_pu: Option<f64>,
    pub kvar_setpoint: Option<f64>,
    pub reward: Option<RewardBreakdown>,
    pub served_kw: Option<f64>,
    /// Switches opened to isolate the current fault (1-based).
    pub fault: Vec<usize>,
    /// A close was refused because it would have formed a loop.
    pub loop_rejected: bool,
    /// Band-count penalty over the energised buses.
    pub band_penalty: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reset {
    pub observation: Vec<f64>,
    pub info: Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Vec<f64>,
    pub reward: f64,
    pub terminated: bool,
    /// Always false; episodes only end by reaching their length.
    pub truncated: bool,
    pub info: Info,
}

/// A resettable episodic environment.
pub trait Env {
    fn action_space(&self) -> ActionSpace;

    fn observation_space(&self) -> ObservationSpace;

    /// Starts a new episode. A seed reseeds the environment's RNG.
    fn reset(&mut self, seed: Option<u64>) -> Result<Reset>;

    /// Applies `action` and advances one interval.
    ///
    /// # Errors
    ///
    /// Returns `Error::EpisodeNotRunning` before the first reset and after
    /// termination, and `Error::InvalidAction` for actions outside the
    /// action space.
    fn step(&mut self, action: &Action) -> Result<Step>;

    fn state(&self) -> EpisodeState;
}

/// Rounds `value` to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
