//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use feeder_gym::circuit::Circuit;
use feeder_gym::config::ScenarioConfig;
use feeder_gym::env::{PvVarEnv, RestorationEnv};
use feeder_gym::runner;

/// IEEE 34-bus preset cut down to 4-step episodes over one day.
pub fn quick_ieee34() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::ieee34_local_pv();
    cfg.simulation.episode_len = 4;
    cfg.simulation.total_steps = 96;
    cfg.training.total_timesteps = 40;
    cfg.training.check_freq = 8;
    cfg
}

/// IEEE 123-bus single-PV preset with hour-long episodes inside one day.
pub fn quick_ieee123() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::ieee123_single_pv();
    cfg.simulation.episode_len = 12;
    cfg.simulation.total_steps = 288;
    cfg.training.total_timesteps = 48;
    cfg
}

/// Restoration preset with a 50-step budget and two evaluation episodes.
pub fn quick_restoration() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::ieee123_restoration();
    cfg.training.total_timesteps = 50;
    cfg.training.check_freq = 10;
    cfg.training.eval_episodes = 2;
    cfg
}

fn circuit(cfg: &ScenarioConfig) -> Circuit {
    let profiles = runner::build_profiles(cfg).expect("profiles should build");
    runner::build_circuit(cfg, profiles).expect("circuit should build")
}

pub fn pv_env(cfg: &ScenarioConfig) -> PvVarEnv<Circuit> {
    PvVarEnv::new(circuit(cfg), runner::pv_var_config(cfg), cfg.simulation.seed)
        .expect("PV environment should build")
}

pub fn restoration_env(cfg: &ScenarioConfig) -> RestorationEnv<Circuit> {
    RestorationEnv::new(circuit(cfg), cfg.restoration.clone(), cfg.simulation.seed)
        .expect("restoration environment should build")
}
