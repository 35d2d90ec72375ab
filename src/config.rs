//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentConfig, TrainerConfig};
use crate::env::{ActionMode, RestorationConfig, RewardConfig, RewardVariant};

/// Top-level scenario configuration parsed from TOML.
///
/// Every table has defaults matching the `ieee34_local_pv` preset. Load
/// from TOML with [`ScenarioConfig::from_toml_file`] or start from a named
/// preset with [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Scenario label used in logs and the API.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub feeder: FeederConfig,
    #[serde(default)]
    pub pv: PvConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub action: ActionMode,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub restoration: RestorationConfig,
}

fn default_name() -> String {
    "custom".to_string()
}

/// Which environment the scenario trains in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvKind {
    /// PV reactive-power control.
    #[default]
    PvVar,
    /// Switch-operation restoration.
    Restoration,
}

/// Solution timing and episode shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub environment: EnvKind,
    /// Master random seed.
    pub seed: u64,
    /// Solution step size (minutes).
    pub step_minutes: u32,
    /// Steps per episode.
    pub episode_len: usize,
    /// Intervals of profile data available to the episodes.
    pub total_steps: usize,
    /// Draw each episode's start interval uniformly from the window.
    pub random_start: bool,
    /// Start interval when `random_start` is off.
    pub start_index: usize,
    /// Decimals kept for per-unit PV powers in step info.
    pub info_decimals: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            environment: EnvKind::PvVar,
            seed: 42,
            step_minutes: 15,
            episode_len: 8640,
            total_steps: 8640,
            random_start: false,
            start_index: 0,
            info_decimals: 3,
        }
    }
}

/// Circuit selection and solution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeederConfig {
    /// Built-in feeder name or path to a TOML feeder file.
    pub circuit: String,
    /// Bus observed by the PV environment.
    pub observe_bus: String,
    pub load_mult: f64,
    pub voltage_bases: Vec<f64>,
    pub control_mode: String,
    pub max_control_iter: usize,
    /// Command script run after the circuit is set up.
    pub script: Option<PathBuf>,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            circuit: "ieee34".to_string(),
            observe_bus: "890".to_string(),
            load_mult: 1.0,
            voltage_bases: vec![69.0, 24.9, 4.16, 0.48],
            control_mode: "off".to_string(),
            max_control_iter: 10,
            script: None,
        }
    }
}

/// The controlled PV system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvConfig {
    pub enabled: bool,
    pub name: String,
    pub bus: String,
    pub kva: f64,
    pub pmpp: f64,
    pub kvar_max: f64,
    pub pct_cutin: f64,
    pub pct_cutout: f64,
}

impl Default for PvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "pv890".to_string(),
            bus: "890".to_string(),
            kva: 550.0,
            pmpp: 500.0,
            kvar_max: 242.0,
            pct_cutin: 0.01,
            pct_cutout: 0.01,
        }
    }
}

/// Profile sources. Anything not given from CSV is synthesised from the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilesConfig {
    /// PV output history; normalised to its peak and used as irradiance.
    pub pv_csv: Option<PathBuf>,
    /// Residential, commercial and industrial loadshape files, in that order.
    pub loadshape_csvs: Vec<PathBuf>,
    pub timestamp_column: String,
    pub value_column: String,
    /// Inclusive date window applied to CSV data.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Constant ambient temperature instead of the synthetic curve.
    pub temperature_c: Option<f64>,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            pv_csv: None,
            loadshape_csvs: Vec::new(),
            timestamp_column: "timestamp".to_string(),
            value_column: "value".to_string(),
            start_date: None,
            end_date: None,
            temperature_c: None,
        }
    }
}

/// Training loop budget and evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub total_timesteps: usize,
    pub check_freq: usize,
    pub log_interval: usize,
    pub checkpoint_dir: Option<PathBuf>,
    /// Greedy episodes run after training.
    pub eval_episodes: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            total_timesteps: 864_000,
            check_freq: 1000,
            log_interval: 10,
            checkpoint_dir: None,
            eval_episodes: 1,
        }
    }
}

impl TrainingConfig {
    pub fn trainer(&self) -> TrainerConfig {
        TrainerConfig {
            total_timesteps: self.total_timesteps,
            check_freq: self.check_freq,
            log_interval: self.log_interval,
            checkpoint_dir: self.checkpoint_dir.clone(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.step_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// IEEE 34-bus feeder, local PV at bus 890, discrete var steps,
    /// voltage-only reward.
    pub fn ieee34_local_pv() -> Self {
        Self {
            name: "ieee34_local_pv".to_string(),
            simulation: SimulationConfig::default(),
            feeder: FeederConfig::default(),
            pv: PvConfig::default(),
            profiles: ProfilesConfig::default(),
            reward: RewardConfig {
                variant: RewardVariant::VoltageOnly,
                ..RewardConfig::default()
            },
            action: ActionMode::Discrete { gain: 100.0 },
            agent: AgentConfig {
                gamma: 0.98,
                ..AgentConfig::default()
            },
            training: TrainingConfig::default(),
            restoration: RestorationConfig::default(),
        }
    }

    /// IEEE 123-bus feeder, single PV at bus 71, continuous setpoint,
    /// week-long episodes at random starts within a 30-day window.
    pub fn ieee123_single_pv() -> Self {
        Self {
            name: "ieee123_single_pv".to_string(),
            simulation: SimulationConfig {
                step_minutes: 5,
                episode_len: 2016,
                total_steps: 8640,
                random_start: true,
                info_decimals: 5,
                ..SimulationConfig::default()
            },
            feeder: FeederConfig {
                circuit: "ieee123".to_string(),
                observe_bus: "71".to_string(),
                load_mult: 1.25,
                voltage_bases: vec![4.16, 0.48],
                ..FeederConfig::default()
            },
            pv: PvConfig {
                name: "pv71".to_string(),
                bus: "71".to_string(),
                kva: 150.0,
                pmpp: 150.0,
                kvar_max: 66.0,
                pct_cutin: 0.05,
                pct_cutout: 0.05,
                ..PvConfig::default()
            },
            profiles: ProfilesConfig::default(),
            reward: RewardConfig::default(),
            action: ActionMode::Continuous,
            agent: AgentConfig {
                gamma: 0.989,
                linear_lr: true,
                ..AgentConfig::default()
            },
            training: TrainingConfig {
                total_timesteps: 100_800,
                ..TrainingConfig::default()
            },
            restoration: RestorationConfig::default(),
        }
    }

    /// IEEE 123-bus feeder with random zone faults and five switch
    /// operations per episode.
    pub fn ieee123_restoration() -> Self {
        Self {
            name: "ieee123_restoration".to_string(),
            simulation: SimulationConfig {
                environment: EnvKind::Restoration,
                step_minutes: 60,
                episode_len: 5,
                total_steps: 24,
                ..SimulationConfig::default()
            },
            feeder: FeederConfig {
                circuit: "ieee123".to_string(),
                observe_bus: "150".to_string(),
                voltage_bases: vec![4.16, 0.48],
                max_control_iter: 50,
                ..FeederConfig::default()
            },
            pv: PvConfig {
                enabled: false,
                ..PvConfig::default()
            },
            profiles: ProfilesConfig {
                temperature_c: Some(25.0),
                ..ProfilesConfig::default()
            },
            reward: RewardConfig::default(),
            action: ActionMode::default(),
            agent: AgentConfig {
                gamma: 1.0,
                learning_starts: 1,
                bins: 10,
                ..AgentConfig::default()
            },
            training: TrainingConfig {
                total_timesteps: 30_000,
                log_interval: 100,
                eval_episodes: 20,
                ..TrainingConfig::default()
            },
            restoration: RestorationConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["ieee34_local_pv", "ieee123_single_pv", "ieee123_restoration"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "ieee34_local_pv" => Ok(Self::ieee34_local_pv()),
            "ieee123_single_pv" => Ok(Self::ieee123_single_pv()),
            "ieee123_restoration" => Ok(Self::ieee123_restoration()),
            _ => Err(ConfigError::new(
                "preset",
                format!("unknown preset \"{name}\", available: {}", Self::PRESETS.join(", ")),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// Relative paths inside the file are resolved against its folder.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            cfg.resolve_paths(dir);
        }
        Ok(cfg)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    fn resolve_paths(&mut self, dir: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        if let Some(p) = self.profiles.pv_csv.as_mut() {
            join(p);
        }
        self.profiles.loadshape_csvs.iter_mut().for_each(join);
        if let Some(p) = self.feeder.script.as_mut() {
            join(p);
        }
        if crate::circuit::presets::builtin(&self.feeder.circuit).is_none() {
            let circuit = Path::new(&self.feeder.circuit);
            if circuit.is_relative() {
                self.feeder.circuit = dir.join(circuit).display().to_string();
            }
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };

        let s = &self.simulation;
        check(
            s.step_minutes > 0 && 1440 % s.step_minutes == 0 && 1440 / s.step_minutes >= 24,
            "simulation.step_minutes",
            "must divide a day into at least 24 intervals",
        );
        check(s.episode_len > 0, "simulation.episode_len", "must be > 0");
        check(s.total_steps > 0, "simulation.total_steps", "must be > 0");
        check(
            !s.random_start || s.total_steps >= s.episode_len,
            "simulation.total_steps",
            "must be >= simulation.episode_len when random_start is on",
        );
        check(s.info_decimals <= 12, "simulation.info_decimals", "must be <= 12");

        let f = &self.feeder;
        check(!f.circuit.trim().is_empty(), "feeder.circuit", "must not be empty");
        check(f.load_mult >= 0.0, "feeder.load_mult", "must be >= 0");
        check(
            ["off", "static", "event", "time"].contains(&f.control_mode.as_str()),
            "feeder.control_mode",
            "must be one of off, static, event, time",
        );

        let pv = &self.pv;
        if s.environment == EnvKind::PvVar {
            check(pv.enabled, "pv.enabled", "the pv_var environment needs a PV system");
        }
        if pv.enabled {
            check(!pv.name.is_empty(), "pv.name", "must not be empty");
            check(pv.kva > 0.0, "pv.kva", "must be > 0");
            check(pv.pmpp >= 0.0, "pv.pmpp", "must be >= 0");
            check(pv.kvar_max >= 0.0, "pv.kvar_max", "must be >= 0");
            check(pv.pct_cutin >= pv.pct_cutout, "pv.pct_cutin", "must be >= pv.pct_cutout");
        }

        let p = &self.profiles;
        check(
            p.loadshape_csvs.is_empty() || p.loadshape_csvs.len() == 3,
            "profiles.loadshape_csvs",
            "must list exactly 3 files or none",
        );
        if let (Some(start), Some(end)) = (p.start_date, p.end_date) {
            check(start <= end, "profiles.start_date", "must be <= profiles.end_date");
        }

        let r = &self.reward;
        check(r.v_min < r.v_max, "reward.v_min", "must be < reward.v_max");
        check(
            r.standard_fraction > 0.0 && r.standard_fraction <= 1.0,
            "reward.standard_fraction",
            "must be in (0, 1]",
        );
        check(r.voltage_limit_penalty >= 0.0, "reward.voltage_limit_penalty", "must be >= 0");

        if let ActionMode::Discrete { gain } = self.action {
            check(gain > 0.0, "action.gain", "must be > 0");
        }

        let a = &self.agent;
        check((0.0..=1.0).contains(&a.gamma), "agent.gamma", "must be in [0, 1]");
        check(
            a.learning_rate > 0.0 && a.learning_rate <= 1.0,
            "agent.learning_rate",
            "must be in (0, 1]",
        );
        for (field, value) in [
            ("agent.exploration_fraction", a.exploration_fraction),
            ("agent.exploration_initial_eps", a.exploration_initial_eps),
            ("agent.exploration_final_eps", a.exploration_final_eps),
        ] {
            check((0.0..=1.0).contains(&value), field, "must be in [0, 1]");
        }
        check(a.bins > 0, "agent.bins", "must be > 0");
        check(a.action_grid >= 2, "agent.action_grid", "must be >= 2");

        let t = &self.training;
        check(t.total_timesteps > 0, "training.total_timesteps", "must be > 0");
        check(t.check_freq > 0, "training.check_freq", "must be > 0");

        let rs = &self.restoration;
        if s.environment == EnvKind::Restoration {
            check(rs.max_steps > 0, "restoration.max_steps", "must be > 0");
            check(!rs.fault_cases.is_empty(), "restoration.fault_cases", "must not be empty");
            check(
                rs.fault_cases.iter().all(|c| !c.is_empty()),
                "restoration.fault_cases",
                "every case must open at least one switch",
            );
        }

        errors
    }
}
