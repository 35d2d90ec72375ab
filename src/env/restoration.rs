//! Emergency restoration by switch operation.
//!
//! Each episode starts from the normal switch configuration with one fault
//! case applied: its isolating switches are opened and locked. The agent
//! then has a few operations to re-energise as much load as possible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::error::{Error, Result};

use super::episode::{EpisodeCounter, EpisodeState};
use super::grid::SwitchableGrid;
use super::reward::band_count_penalty;
use super::types::{Action, ActionSpace, Env, Info, ObservationSpace, Reset, Step};

/// Fault cases for the built-in 123-bus feeder, as 1-based switch numbers.
/// Each case opens the switches bounding one zone, ties included.
pub const IEEE123_FAULT_CASES: &[&[usize]] = &[
    &[1, 2, 3],
    &[2, 8],
    &[3, 4, 10],
    &[4, 5],
    &[5, 8, 9],
    &[6, 7, 10],
    &[7, 9],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestorationConfig {
    /// Switch operations per episode.
    pub max_steps: usize,
    /// Switch sets opened by each fault, 1-based in feeder switch order.
    pub fault_cases: Vec<Vec<usize>>,
    /// Buses at or below this voltage count as de-energised.
    pub energized_threshold_pu: f64,
    /// Upper observation bound for power readings (kW).
    pub max_kw: f64,
    pub v_min: f64,
    pub v_max: f64,
}

impl Default for RestorationConfig {
    fn default() -> Self {
        Self {
            max_steps: 5,
            fault_cases: IEEE123_FAULT_CASES.iter().map(|c| c.to_vec()).collect(),
            energized_threshold_pu: 0.1,
            max_kw: 5000.0,
            v_min: 0.95,
            v_max: 1.05,
        }
    }
}

/// Switch-operation environment over a [`SwitchableGrid`].
///
/// Action `0` does nothing and action `k` toggles switch `k`. The
/// observation is `[head kW, min V, max V, |kW| per switch.., state per
/// switch..]`; the reward is the served load relative to the intact
/// network.
pub struct RestorationEnv<S> {
    sim: S,
    config: RestorationConfig,
    switches: Vec<String>,
    counter: EpisodeCounter,
    rng: StdRng,
    fault_case: usize,
    normal_served_kw: f64,
}

impl<S: SwitchableGrid> RestorationEnv<S> {
    /// # Errors
    ///
    /// Returns `Error::Config` when the grid has no switches, no fault case
    /// is configured or a case names a switch that does not exist.
    pub fn new(sim: S, config: RestorationConfig, seed: u64) -> Result<Self> {
        let switches = sim.switch_names();
        if switches.is_empty() {
            return Err(ConfigError::new("feeder", "restoration needs a feeder with switches").into());
        }
        if config.fault_cases.is_empty() {
            return Err(ConfigError::new("restoration.fault_cases", "at least one fault case is required").into());
        }
        for (i, case) in config.fault_cases.iter().enumerate() {
            if let Some(bad) = case.iter().find(|k| **k == 0 || **k > switches.len()) {
                return Err(ConfigError::new(
                    format!("restoration.fault_cases[{i}]"),
                    format!("switch {bad} not in 1..={}", switches.len()),
                )
                .into());
            }
        }
        Ok(Self {
            sim,
            counter: EpisodeCounter::new(config.max_steps),
            config,
            switches,
            rng: StdRng::seed_from_u64(seed),
            fault_case: 0,
            normal_served_kw: 0.0,
        })
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    pub fn switches(&self) -> &[String] {
        &self.switches
    }

    /// Index into the configured fault cases for the current episode.
    pub fn fault_case(&self) -> usize {
        self.fault_case
    }

    fn fault(&self) -> &[usize] {
        &self.config.fault_cases[self.fault_case]
    }

    /// Starts an episode with a chosen fault case.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAction` for an unknown case and solver errors
    /// from the initial solves.
    pub fn reset_with_fault(&mut self, case: usize) -> Result<Reset> {
        if case >= self.config.fault_cases.len() {
            return Err(Error::InvalidAction(format!(
                "fault case {case} not in 0..{}",
                self.config.fault_cases.len()
            )));
        }
        self.sim.restore_normal_switches();
        self.sim.solve()?;
        self.normal_served_kw = self.sim.served_load_kw()?;

        self.fault_case = case;
        for &k in &self.config.fault_cases[case] {
            self.sim.set_switch(&self.switches[k - 1], false)?;
        }
        self.sim.solve()?;
        self.counter.reset();
        debug!(case, fault = ?self.fault(), normal_kw = self.normal_served_kw, "episode reset");

        let (observation, info) = self.observe()?;
        Ok(Reset { observation, info })
    }

    fn observe(&self) -> Result<(Vec<f64>, Info)> {
        let voltages = self.sim.energized_voltages(self.config.energized_threshold_pu)?;
        let v_min = voltages.iter().copied().fold(f64::INFINITY, f64::min);
        let v_max = voltages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (v_min, v_max) = if voltages.is_empty() { (0.0, 0.0) } else { (v_min, v_max) };

        let mut obs = Vec::with_capacity(3 + 2 * self.switches.len());
        obs.push(self.sim.head_kw()?);
        obs.push(v_min);
        obs.push(v_max);
        for name in &self.switches {
            obs.push(self.sim.line_kw(name)?.abs());
        }
        for name in &self.switches {
            obs.push(if self.sim.switch_closed(name)? { 1.0 } else { 0.0 });
        }

        let info = Info {
            interval: Some(self.sim.solved_interval()?),
            voltage_pu: Some(v_min),
            served_kw: Some(self.sim.served_load_kw()?),
            fault: self.fault().to_vec(),
            band_penalty: Some(band_count_penalty(&voltages, self.config.v_min, self.config.v_max)),
            ..Info::default()
        };
        Ok((obs, info))
    }
}

impl<S: SwitchableGrid> Env for RestorationEnv<S> {
    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(self.switches.len() + 1)
    }

    fn observation_space(&self) -> ObservationSpace {
        let n = self.switches.len();
        let mut low = vec![0.0; 3 + 2 * n];
        let mut high = vec![self.config.max_kw; 3 + 2 * n];
        low[1] = 0.8;
        low[2] = 0.8;
        high[1] = 1.1;
        high[2] = 1.1;
        high[3 + n..].fill(1.0);
        ObservationSpace { low, high }
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<Reset> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        let case = self.rng.random_range(0..self.config.fault_cases.len());
        self.reset_with_fault(case)
    }

    fn step(&mut self, action: &Action) -> Result<Step> {
        self.counter.ensure_running()?;
        let k = match *action {
            Action::Discrete(k) if k <= self.switches.len() => k,
            _ => {
                return Err(Error::InvalidAction(format!(
                    "{action:?} does not fit {:?}",
                    self.action_space()
                )));
            }
        };

        let mut loop_rejected = false;
        if k != 0 && !self.fault().contains(&k) {
            let name = self.switches[k - 1].clone();
            if self.sim.switch_closed(&name)? {
                self.sim.set_switch(&name, false)?;
            } else {
                self.sim.set_switch(&name, true)?;
                if !self.sim.is_radial() {
                    self.sim.set_switch(&name, false)?;
                    loop_rejected = true;
                    debug!(switch = %name, "close refused, would form a loop");
                }
            }
        }
        self.sim.solve()?;

        let served = self.sim.served_load_kw()?;
        let reward = if self.normal_served_kw > 0.0 {
            served / self.normal_served_kw
        } else {
            0.0
        };
        let terminated = self.counter.advance()?;
        let (observation, mut info) = self.observe()?;
        info.loop_rejected = loop_rejected;

        Ok(Step {
            observation,
            reward,
            terminated,
            truncated: false,
            info,
        })
    }

    fn state(&self) -> EpisodeState {
        self.counter.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::profile::ProfileSet;

    fn env() -> RestorationEnv<Circuit> {
        let mut circuit = Circuit::new(ProfileSet::constant(0.0, 25.0, 1.0));
        circuit.command("compile ieee123").unwrap();
        RestorationEnv::new(circuit, RestorationConfig::default(), 5).unwrap()
    }

    fn state_of(env: &RestorationEnv<Circuit>, obs: &[f64], switch: usize) -> f64 {
        obs[3 + env.switches().len() + switch - 1]
    }

    #[test]
    fn spaces_follow_switch_count() {
        let env = env();
        assert_eq!(env.action_space(), ActionSpace::Discrete(11));
        assert_eq!(env.observation_space().dim(), 23);
    }

    #[test]
    fn reset_opens_fault_switches() {
        let mut env = env();
        let reset = env.reset_with_fault(2).unwrap();
        assert_eq!(reset.info.fault, vec![3, 4, 10]);
        for k in [3, 4, 10] {
            assert_eq!(state_of(&env, &reset.observation, k), 0.0);
        }
        assert_eq!(state_of(&env, &reset.observation, 1), 1.0);
        assert_eq!(state_of(&env, &reset.observation, 8), 0.0);
        assert!(reset.observation[1] > 0.8 && reset.observation[2] <= 1.04 + 1e-12);
    }

    #[test]
    fn closing_a_tie_restores_load() {
        let mut env = env();
        env.reset_with_fault(2).unwrap();
        let idle = env.step(&Action::Discrete(0)).unwrap();
        assert!(idle.reward < 1.0);
        let closed = env.step(&Action::Discrete(8)).unwrap();
        assert!(closed.reward > idle.reward);
        assert!(!closed.info.loop_rejected);
        assert!(closed.observation[3 + 7] > 0.0, "tie carries power");
    }

    #[test]
    fn loop_forming_close_is_refused() {
        let mut env = env();
        env.reset_with_fault(2).unwrap();
        env.step(&Action::Discrete(8)).unwrap();
        let step = env.step(&Action::Discrete(9)).unwrap();
        assert!(step.info.loop_rejected);
        assert_eq!(state_of(&env, &step.observation, 9), 0.0);
    }

    #[test]
    fn fault_switches_are_locked() {
        let mut env = env();
        env.reset_with_fault(2).unwrap();
        let step = env.step(&Action::Discrete(3)).unwrap();
        assert_eq!(state_of(&env, &step.observation, 3), 0.0);
    }

    #[test]
    fn episode_ends_after_max_steps() {
        let mut env = env();
        env.reset(Some(1)).unwrap();
        let flags: Vec<bool> = (0..5)
            .map(|_| env.step(&Action::Discrete(0)).unwrap().terminated)
            .collect();
        assert_eq!(flags, vec![false, false, false, false, true]);
        assert!(matches!(
            env.step(&Action::Discrete(0)),
            Err(Error::EpisodeNotRunning { .. })
        ));
    }

    #[test]
    fn opening_a_sectionaliser_loses_load() {
        let mut env = env();
        env.reset_with_fault(6).unwrap();
        let before = env.step(&Action::Discrete(0)).unwrap().reward;
        let after = env.step(&Action::Discrete(1)).unwrap().reward;
        assert!(after < before);
    }

    #[test]
    fn invalid_inputs() {
        let mut env = env();
        assert!(env.reset_with_fault(99).is_err());
        env.reset(None).unwrap();
        assert!(matches!(env.step(&Action::Discrete(11)), Err(Error::InvalidAction(_))));
        assert!(matches!(env.step(&Action::Continuous(0.0)), Err(Error::InvalidAction(_))));

        let mut circuit = Circuit::new(ProfileSet::constant(0.0, 25.0, 1.0));
        circuit.command("compile ieee123").unwrap();
        let config = RestorationConfig {
            fault_cases: vec![vec![11]],
            ..RestorationConfig::default()
        };
        assert!(RestorationEnv::new(circuit, config, 0).is_err());
    }
}
