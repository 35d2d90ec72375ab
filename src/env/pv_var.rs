//! Local PV reactive-power control environment.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::error::{Error, Result};

use super::episode::{EpisodeCounter, EpisodeState};
use super::grid::GridSimulator;
use super::reward::RewardConfig;
use super::types::{Action, ActionSpace, Env, Info, ObservationSpace, Reset, Step, round_to};

/// How an action becomes a kvar setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case", deny_unknown_fields)]
pub enum ActionMode {
    /// `0` hold, `1` lower, `2` raise by `|v - 1| * gain` kvar, where `v`
    /// is the voltage seen after the previous step.
    Discrete { gain: f64 },
    /// A value in `[-1, 1]` scaled by the rated kVA.
    Continuous,
}

impl Default for ActionMode {
    fn default() -> Self {
        Self::Discrete { gain: 100.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PvVarConfig {
    /// Bus whose voltage is observed.
    pub bus: String,
    /// Controlled PV system.
    pub pv: String,
    pub action: ActionMode,
    pub episode_len: usize,
    /// Length of the profile window a random start is drawn from.
    pub total_steps: usize,
    pub random_start: bool,
    /// Start interval when `random_start` is off.
    pub start_index: usize,
    /// Decimals kept for the per-unit powers in `Info`.
    pub info_decimals: u32,
    pub reward: RewardConfig,
}

/// Controls one PV system's reactive power to hold its bus near 1 pu.
///
/// The observation is the single bus voltage in pu, bounded to
/// `[0.9, 1.1]`.
pub struct PvVarEnv<S> {
    sim: S,
    config: PvVarConfig,
    counter: EpisodeCounter,
    rng: StdRng,
    start_index: usize,
    last_voltage: f64,
    q_violations: usize,
    voltage_violations: usize,
}

impl<S: GridSimulator> PvVarEnv<S> {
    /// # Errors
    ///
    /// Returns `Error::Config` for a non-positive discrete gain or a random
    /// start window shorter than one episode.
    pub fn new(sim: S, config: PvVarConfig, seed: u64) -> Result<Self> {
        if let ActionMode::Discrete { gain } = config.action {
            if gain.is_nan() || gain <= 0.0 {
                return Err(ConfigError::new("action.gain", format!("must be > 0, got {gain}")).into());
            }
        }
        if config.random_start && config.total_steps < config.episode_len {
            return Err(ConfigError::new(
                "simulation.total_steps",
                format!(
                    "random start needs total_steps ({}) >= episode_len ({})",
                    config.total_steps, config.episode_len
                ),
            )
            .into());
        }
        Ok(Self {
            sim,
            counter: EpisodeCounter::new(config.episode_len),
            config,
            rng: StdRng::seed_from_u64(seed),
            start_index: 0,
            last_voltage: 1.0,
            q_violations: 0,
            voltage_violations: 0,
        })
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    pub fn config(&self) -> &PvVarConfig {
        &self.config
    }

    /// Interval the current episode started at.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn q_violations(&self) -> usize {
        self.q_violations
    }

    pub fn voltage_violations(&self) -> usize {
        self.voltage_violations
    }

    fn setpoint_for(&self, action: &Action, current_kvar: f64, kva: f64) -> Result<f64> {
        match (self.config.action, action) {
            (ActionMode::Discrete { gain }, Action::Discrete(a)) => {
                let delta = (self.last_voltage - 1.0).abs() * gain;
                match a {
                    0 => Ok(current_kvar),
                    1 => Ok(current_kvar - delta),
                    2 => Ok(current_kvar + delta),
                    _ => Err(Error::InvalidAction(format!("discrete action {a} not in 0..3"))),
                }
            }
            (ActionMode::Continuous, Action::Continuous(a)) if (-1.0..=1.0).contains(a) => Ok(a * kva),
            _ => Err(Error::InvalidAction(format!(
                "{action:?} does not fit {:?}",
                self.action_space()
            ))),
        }
    }

    fn info(&self, voltage: f64) -> Result<Info> {
        let reading = self.sim.pv_reading(&self.config.pv)?;
        let (p_pu, q_pu) = if reading.kva > 0.0 {
            (
                round_to(reading.kw / reading.kva, self.config.info_decimals),
                round_to(reading.kvar / reading.kva, self.config.info_decimals),
            )
        } else {
            (0.0, 0.0)
        };
        Ok(Info {
            interval: Some(self.sim.solved_interval()?),
            voltage_pu: Some(voltage),
            p_pu: Some(p_pu),
            q_pu: Some(q_pu),
            kvar_setpoint: Some(reading.kvar),
            ..Info::default()
        })
    }
}

impl<S: GridSimulator> Env for PvVarEnv<S> {
    fn action_space(&self) -> ActionSpace {
        match self.config.action {
            ActionMode::Discrete { .. } => ActionSpace::Discrete(3),
            ActionMode::Continuous => ActionSpace::Continuous { low: -1.0, high: 1.0 },
        }
    }

    fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::uniform(1, 0.9, 1.1)
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<Reset> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.start_index = if self.config.random_start {
            self.rng
                .random_range(0..=self.config.total_steps - self.config.episode_len)
        } else {
            self.config.start_index
        };
        self.sim.flat_start(self.start_index)?;

        let voltage = self.sim.bus_voltage_pu(&self.config.bus)?;
        self.last_voltage = voltage;
        self.q_violations = 0;
        self.voltage_violations = 0;
        self.counter.reset();
        debug!(start = self.start_index, voltage, "episode reset");

        Ok(Reset {
            observation: vec![voltage],
            info: self.info(voltage)?,
        })
    }

    fn step(&mut self, action: &Action) -> Result<Step> {
        self.counter.ensure_running()?;

        // 1. Translate the action into a kvar setpoint
        let reading = self.sim.pv_reading(&self.config.pv)?;
        let kvar = self.setpoint_for(action, reading.kvar, reading.kva)?;
        self.sim.set_pv_kvar(&self.config.pv, kvar)?;

        // 2. Solve this interval and move the clock on
        self.sim.advance()?;

        // 3. Observe and score
        let voltage = self.sim.bus_voltage_pu(&self.config.bus)?;
        let reading = self.sim.pv_reading(&self.config.pv)?;
        let breakdown = self
            .config
            .reward
            .evaluate(reading.kva, reading.kw, reading.kvar, voltage);
        self.q_violations += usize::from(breakdown.q_violation);
        self.voltage_violations += usize::from(breakdown.voltage_violation);
        self.last_voltage = voltage;

        let terminated = self.counter.advance()?;
        let mut info = self.info(voltage)?;
        info.reward = Some(breakdown);

        Ok(Step {
            observation: vec![voltage],
            reward: breakdown.total,
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
pub(crate) mod tests {
    use super::*;
    use crate::env::grid::PvReading;
    use crate::env::reward::RewardVariant;

    /// Linear stand-in: `v = base[t] + sensitivity * kvar`.
    pub(crate) struct MockGrid {
        pub base: Vec<f64>,
        pub sensitivity: f64,
        pub pv_kw: f64,
        pub kva: f64,
        pub kvar: f64,
        pub interval: usize,
        pub solved: Option<usize>,
        pub voltage: f64,
        pub starts: Vec<usize>,
    }

    impl MockGrid {
        pub(crate) fn new(base: Vec<f64>) -> Self {
            Self {
                base,
                sensitivity: 0.0001,
                pv_kw: 50.0,
                kva: 66.0,
                kvar: 0.0,
                interval: 0,
                solved: None,
                voltage: 1.0,
                starts: Vec::new(),
            }
        }

        fn solve(&mut self) {
            let base = self.base[self.interval % self.base.len()];
            self.voltage = base + self.sensitivity * self.kvar;
            self.solved = Some(self.interval);
        }
    }

    impl GridSimulator for MockGrid {
        fn flat_start(&mut self, start_index: usize) -> Result<()> {
            self.kvar = 0.0;
            self.interval = start_index;
            self.starts.push(start_index);
            self.solve();
            Ok(())
        }

        fn advance(&mut self) -> Result<()> {
            self.solve();
            self.interval += 1;
            Ok(())
        }

        fn solved_interval(&self) -> Result<usize> {
            self.solved.ok_or(Error::NotSolved)
        }

        fn bus_voltage_pu(&self, bus: &str) -> Result<f64> {
            if bus != "890" {
                return Err(Error::UnknownElement {
                    kind: "bus",
                    name: bus.into(),
                });
            }
            Ok(self.voltage)
        }

        fn pv_reading(&self, _pv: &str) -> Result<PvReading> {
            Ok(PvReading {
                kw: self.pv_kw,
                kvar: self.kvar,
                kva: self.kva,
            })
        }

        fn set_pv_kvar(&mut self, _pv: &str, kvar: f64) -> Result<()> {
            self.kvar = kvar;
            Ok(())
        }
    }

    pub(crate) fn config(action: ActionMode, episode_len: usize) -> PvVarConfig {
        PvVarConfig {
            bus: "890".into(),
            pv: "pv890".into(),
            action,
            episode_len,
            total_steps: 100,
            random_start: false,
            start_index: 0,
            info_decimals: 3,
            reward: RewardConfig::default(),
        }
    }

    fn discrete_env(base: Vec<f64>, len: usize) -> PvVarEnv<MockGrid> {
        PvVarEnv::new(MockGrid::new(base), config(ActionMode::default(), len), 7).unwrap()
    }

    #[test]
    fn step_before_reset_is_rejected() {
        let mut env = discrete_env(vec![1.0], 3);
        let err = env.step(&Action::Discrete(0)).unwrap_err();
        assert!(matches!(err, Error::EpisodeNotRunning { state: "idle" }));
    }

    #[test]
    fn terminates_exactly_at_episode_length() {
        let mut env = discrete_env(vec![1.0], 4);
        env.reset(None).unwrap();
        let flags: Vec<bool> = (0..4)
            .map(|_| env.step(&Action::Discrete(0)).unwrap().terminated)
            .collect();
        assert_eq!(flags, vec![false, false, false, true]);
        assert_eq!(env.state(), EpisodeState::Terminated);
        assert!(env.step(&Action::Discrete(0)).is_err());
        env.reset(None).unwrap();
        assert!(!env.step(&Action::Discrete(0)).unwrap().terminated);
    }

    #[test]
    fn discrete_raise_uses_previous_voltage() {
        let mut env = discrete_env(vec![0.96], 10);
        let reset = env.reset(None).unwrap();
        assert_eq!(reset.observation, vec![0.96]);

        let step = env.step(&Action::Discrete(2)).unwrap();
        // |0.96 - 1| * 100 = 4 kvar
        let kvar = step.info.kvar_setpoint.unwrap();
        assert!((kvar - 4.0).abs() < 1e-9);
        assert!((step.observation[0] - (0.96 + 0.0004)).abs() < 1e-12);

        let step = env.step(&Action::Discrete(1)).unwrap();
        let delta = (0.9604_f64 - 1.0).abs() * 100.0;
        assert!((step.info.kvar_setpoint.unwrap() - (4.0 - delta)).abs() < 1e-9);

        let hold = env.step(&Action::Discrete(0)).unwrap();
        assert_eq!(hold.info.kvar_setpoint, step.info.kvar_setpoint);
    }

    #[test]
    fn continuous_action_scales_rated_kva() {
        let cfg = config(ActionMode::Continuous, 5);
        let mut env = PvVarEnv::new(MockGrid::new(vec![1.0]), cfg, 1).unwrap();
        env.reset(None).unwrap();
        let step = env.step(&Action::Continuous(0.5)).unwrap();
        assert!((step.info.kvar_setpoint.unwrap() - 33.0).abs() < 1e-12);
        assert_eq!(step.info.q_pu, Some(0.5));
        assert!(matches!(
            env.step(&Action::Continuous(1.5)),
            Err(Error::InvalidAction(_))
        ));
        assert!(matches!(env.step(&Action::Discrete(1)), Err(Error::InvalidAction(_))));
    }

    #[test]
    fn info_rounds_to_configured_decimals() {
        let mut cfg = config(ActionMode::Continuous, 5);
        cfg.info_decimals = 5;
        let mut grid = MockGrid::new(vec![1.0]);
        grid.pv_kw = 12.345678;
        let mut env = PvVarEnv::new(grid, cfg.clone(), 1).unwrap();
        let reset = env.reset(None).unwrap();
        assert_eq!(reset.info.p_pu, Some(round_to(12.345678 / 66.0, 5)));
        assert_eq!(reset.info.p_pu, Some(0.18706));

        cfg.info_decimals = 3;
        let mut grid = MockGrid::new(vec![1.0]);
        grid.pv_kw = 12.345678;
        let mut env = PvVarEnv::new(grid, cfg, 1).unwrap();
        assert_eq!(env.reset(None).unwrap().info.p_pu, Some(0.187));
    }

    #[test]
    fn reward_and_violation_counts() {
        let cfg = config(ActionMode::Continuous, 5);
        let mut grid = MockGrid::new(vec![1.0]);
        grid.sensitivity = 0.0;
        let mut env = PvVarEnv::new(grid, cfg, 1).unwrap();
        env.reset(None).unwrap();
        // 40 kvar on a 66 kVA unit producing 50 kW
        let step = env.step(&Action::Continuous(40.0 / 66.0)).unwrap();
        let r = step.info.reward.unwrap();
        assert_eq!(r.nameplate, 0.0);
        assert!((r.standard + 120.1216).abs() < 1e-6);
        assert_eq!(step.reward, r.total);
        assert_eq!(env.q_violations(), 1);
        assert_eq!(env.voltage_violations(), 0);
    }

    #[test]
    fn voltage_only_variant() {
        let mut cfg = config(ActionMode::Continuous, 5);
        cfg.reward.variant = RewardVariant::VoltageOnly;
        let mut env = PvVarEnv::new(MockGrid::new(vec![1.06]), cfg, 1).unwrap();
        env.reset(None).unwrap();
        let step = env.step(&Action::Continuous(1.0)).unwrap();
        let v = step.observation[0];
        assert!((step.reward + (v - 1.0).powi(2) + 1.0).abs() < 1e-12);
        assert_eq!(env.q_violations(), 1);
        assert_eq!(env.voltage_violations(), 1);
    }

    #[test]
    fn random_start_is_bounded_and_seeded() {
        let mut cfg = config(ActionMode::default(), 10);
        cfg.random_start = true;
        cfg.total_steps = 30;
        let mut env = PvVarEnv::new(MockGrid::new(vec![1.0]), cfg.clone(), 0).unwrap();
        for _ in 0..50 {
            env.reset(None).unwrap();
            assert!(env.start_index() <= 20);
        }
        env.reset(Some(99)).unwrap();
        let a = env.start_index();
        env.reset(Some(99)).unwrap();
        assert_eq!(env.start_index(), a);
    }

    #[test]
    fn fixed_start_and_interval_advance() {
        let mut cfg = config(ActionMode::default(), 3);
        cfg.start_index = 12;
        let mut env = PvVarEnv::new(MockGrid::new(vec![1.0]), cfg, 0).unwrap();
        let reset = env.reset(None).unwrap();
        assert_eq!(reset.info.interval, Some(12));
        assert_eq!(env.step(&Action::Discrete(0)).unwrap().info.interval, Some(12));
        assert_eq!(env.step(&Action::Discrete(0)).unwrap().info.interval, Some(13));
    }

    #[test]
    fn rejects_short_random_window() {
        let mut cfg = config(ActionMode::default(), 10);
        cfg.random_start = true;
        cfg.total_steps = 5;
        assert!(PvVarEnv::new(MockGrid::new(vec![1.0]), cfg, 0).is_err());
    }
}
