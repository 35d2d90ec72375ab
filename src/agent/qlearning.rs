//! Tabular Q-learning agent.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::env::{Action, ActionSpace, ObservationSpace};
use crate::error::{Error, Result};

/// Hyperparameters of the agent and its training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub learning_rate: f64,
    /// Decay the learning rate linearly to zero over training.
    pub linear_lr: bool,
    /// Discount factor.
    pub gamma: f64,
    pub exploration_fraction: f64,
    pub exploration_initial_eps: f64,
    pub exploration_final_eps: f64,
    /// Steps of uniform random actions before learning begins.
    pub learning_starts: usize,
    /// Bins per observation dimension.
    pub bins: usize,
    /// Grid points over `[-1, 1]` for continuous actions.
    pub action_grid: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            linear_lr: false,
            gamma: 0.99,
            exploration_fraction: 0.1,
            exploration_initial_eps: 1.0,
            exploration_final_eps: 0.05,
            learning_starts: 0,
            bins: 20,
            action_grid: 21,
        }
    }
}

/// Maps an observation vector onto uniform bins within the space bounds.
/// Values outside the bounds fall in the edge bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretizer {
    low: Vec<f64>,
    high: Vec<f64>,
    bins: usize,
}

impl Discretizer {
    pub fn new(space: &ObservationSpace, bins: usize) -> Self {
        Self {
            low: space.low.clone(),
            high: space.high.clone(),
            bins: bins.max(1),
        }
    }

    pub fn bin(&self, dim: usize, value: f64) -> usize {
        let (low, high) = (self.low[dim], self.high[dim]);
        if !value.is_finite() || high <= low {
            return 0;
        }
        let frac = (value - low) / (high - low);
        ((frac * self.bins as f64).floor().max(0.0) as usize).min(self.bins - 1)
    }

    /// Table key for `obs`, e.g. `"3,0,7"`.
    pub fn key(&self, obs: &[f64]) -> String {
        obs.iter()
            .take(self.low.len())
            .enumerate()
            .map(|(i, v)| self.bin(i, *v).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// The finite action set the table is indexed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSet {
    Discrete(usize),
    /// Continuous actions restricted to these values.
    Grid(Vec<f64>),
}

impl ActionSet {
    pub fn from_space(space: &ActionSpace, grid_points: usize) -> Self {
        match *space {
            ActionSpace::Discrete(n) => Self::Discrete(n),
            ActionSpace::Continuous { low, high } => {
                let n = grid_points.max(2);
                let step = (high - low) / (n - 1) as f64;
                Self::Grid((0..n).map(|i| low + step * i as f64).collect())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Discrete(n) => *n,
            Self::Grid(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn action(&self, index: usize) -> Action {
        match self {
            Self::Discrete(_) => Action::Discrete(index),
            Self::Grid(values) => Action::Continuous(values[index]),
        }
    }

    /// Action taken in states never visited: `0` for discrete sets, the
    /// grid point nearest zero otherwise.
    pub fn neutral(&self) -> usize {
        match self {
            Self::Discrete(_) => 0,
            Self::Grid(values) => values
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
                .map_or(0, |(i, _)| i),
        }
    }
}

/// Epsilon-greedy tabular Q-learning.
///
/// The table is keyed by discretised observation; unseen states read as
/// all-zero rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QAgent {
    discretizer: Discretizer,
    actions: ActionSet,
    gamma: f64,
    table: BTreeMap<String, Vec<f64>>,
}

impl QAgent {
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty action space or a discount
    /// outside `[0, 1]`.
    pub fn new(observation: &ObservationSpace, action: &ActionSpace, config: &AgentConfig) -> Result<Self> {
        let actions = ActionSet::from_space(action, config.action_grid);
        if actions.is_empty() {
            return Err(ConfigError::new("agent", "action space is empty").into());
        }
        if !(0.0..=1.0).contains(&config.gamma) {
            return Err(ConfigError::new("agent.gamma", "must be in [0, 1]").into());
        }
        Ok(Self {
            discretizer: Discretizer::new(observation, config.bins),
            actions,
            gamma: config.gamma,
            table: BTreeMap::new(),
        })
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn action(&self, index: usize) -> Action {
        self.actions.action(index)
    }

    /// Number of visited states.
    pub fn states(&self) -> usize {
        self.table.len()
    }

    pub fn q_values(&self, obs: &[f64]) -> Option<&[f64]> {
        self.table.get(&self.discretizer.key(obs)).map(Vec::as_slice)
    }

    /// Index of the best action; ties go to the lowest index.
    pub fn greedy_index(&self, obs: &[f64]) -> usize {
        match self.q_values(obs) {
            None => self.actions.neutral(),
            Some(q) => q
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, v)| if *v > best.1 { (i, *v) } else { best })
                .0,
        }
    }

    pub fn predict(&self, obs: &[f64]) -> Action {
        self.action(self.greedy_index(obs))
    }

    /// Epsilon-greedy choice.
    pub fn select(&self, obs: &[f64], epsilon: f64, rng: &mut impl Rng) -> usize {
        if rng.random::<f64>() < epsilon {
            rng.random_range(0..self.actions.len())
        } else {
            self.greedy_index(obs)
        }
    }

    /// One Q-learning update; returns the TD error.
    pub fn update(
        &mut self,
        obs: &[f64],
        action: usize,
        reward: f64,
        next_obs: &[f64],
        terminated: bool,
        learning_rate: f64,
    ) -> f64 {
        let future = if terminated {
            0.0
        } else {
            self.q_values(next_obs)
                .map_or(0.0, |q| q.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        };
        let target = reward + self.gamma * future;
        let n = self.actions.len();
        let row = self
            .table
            .entry(self.discretizer.key(obs))
            .or_insert_with(|| vec![0.0; n]);
        let td = target - row[action];
        row[action] += learning_rate * td;
        td
    }

    /// Writes the agent as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` when the file cannot be created and
    /// `Error::Json` when serialisation fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Reads an agent written by [`QAgent::save`].
    ///
    /// # Errors
    ///
    /// Returns `Error::ReadFile` when the file cannot be opened,
    /// `Error::Json` for malformed JSON and `Error::Config` when a table
    /// row does not have one value per action.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let agent: Self = serde_json::from_reader(BufReader::new(file))?;
        let n = agent.actions.len();
        if n == 0 {
            return Err(ConfigError::new("agent", "checkpoint has no actions").into());
        }
        if let Some((key, row)) = agent.table.iter().find(|(_, row)| row.len() != n) {
            return Err(ConfigError::new(
                "agent.table",
                format!("state {key} has {} values, expected {n}", row.len()),
            )
            .into());
        }
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn pv_agent() -> QAgent {
        QAgent::new(
            &ObservationSpace::uniform(1, 0.9, 1.1),
            &ActionSpace::Discrete(3),
            &AgentConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn discretizer_clamps_to_edge_bins() {
        let d = Discretizer::new(&ObservationSpace::uniform(1, 0.9, 1.1), 20);
        assert_eq!(d.bin(0, 0.5), 0);
        assert_eq!(d.bin(0, 0.9), 0);
        assert_eq!(d.bin(0, 1.005), 10);
        assert_eq!(d.bin(0, 1.1), 19);
        assert_eq!(d.bin(0, 2.0), 19);
        assert_eq!(d.bin(0, f64::NAN), 0);
        assert_eq!(d.key(&[1.005]), "10");
    }

    #[test]
    fn continuous_actions_use_a_grid() {
        let set = ActionSet::from_space(&ActionSpace::Continuous { low: -1.0, high: 1.0 }, 5);
        assert_eq!(set, ActionSet::Grid(vec![-1.0, -0.5, 0.0, 0.5, 1.0]));
        assert_eq!(set.neutral(), 2);
        assert_eq!(set.action(4), Action::Continuous(1.0));
    }

    #[test]
    fn unseen_state_takes_neutral_action() {
        let agent = pv_agent();
        assert!(agent.q_values(&[1.0]).is_none());
        assert_eq!(agent.predict(&[1.0]), Action::Discrete(0));
    }

    #[test]
    fn update_moves_toward_target() {
        let mut agent = pv_agent();
        let td = agent.update(&[0.96], 2, -1.0, &[0.98], false, 0.5);
        assert_eq!(td, -1.0);
        assert_eq!(agent.q_values(&[0.96]).unwrap(), &[0.0, 0.0, -0.5]);
        // hold is now the best action in that state
        assert_eq!(agent.greedy_index(&[0.96]), 0);
        agent.update(&[0.96], 0, -2.0, &[0.96], true, 1.0);
        assert_eq!(agent.greedy_index(&[0.96]), 1);
    }

    #[test]
    fn bootstraps_from_next_state() {
        let mut agent = pv_agent();
        agent.update(&[1.0], 1, 1.0, &[1.0], true, 1.0);
        agent.update(&[0.95], 0, 0.0, &[1.0], false, 1.0);
        let q = agent.q_values(&[0.95]).unwrap()[0];
        assert!((q - 0.99).abs() < 1e-12);
    }

    #[test]
    fn greedy_when_epsilon_zero() {
        let mut agent = pv_agent();
        agent.update(&[1.0], 2, 5.0, &[1.0], true, 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!((0..20).all(|_| agent.select(&[1.0], 0.0, &mut rng) == 2));
        let explored: std::collections::HashSet<usize> =
            (0..200).map(|_| agent.select(&[1.0], 1.0, &mut rng)).collect();
        assert_eq!(explored.len(), 3);
    }

    #[test]
    fn save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        let mut agent = pv_agent();
        agent.update(&[1.02], 1, -0.3, &[1.0], false, 0.1);
        agent.save(&path).unwrap();
        let loaded = QAgent::load(&path).unwrap();
        assert_eq!(loaded.states(), 1);
        assert_eq!(loaded.actions(), agent.actions());
        let (a, b) = (loaded.q_values(&[1.02]).unwrap(), agent.q_values(&[1.02]).unwrap());
        assert!((a[1] - b[1]).abs() < 1e-12);
        assert!(QAgent::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn load_rejects_rows_that_do_not_match_actions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        let mut agent = pv_agent();
        agent.update(&[1.02], 1, -0.3, &[1.0], false, 0.1);
        let mut json = serde_json::to_value(&agent).unwrap();
        for row in json["table"].as_object_mut().unwrap().values_mut() {
            *row = serde_json::json!([0.0]);
        }
        std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();
        let err = QAgent::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn rejects_bad_gamma() {
        let config = AgentConfig {
            gamma: 1.5,
            ..AgentConfig::default()
        };
        let result = QAgent::new(&ObservationSpace::uniform(1, 0.0, 1.0), &ActionSpace::Discrete(2), &config);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
