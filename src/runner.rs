//! Scenario wiring: profiles, circuit, environment, training and evaluation.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::agent::{EpisodeRecord, Evaluation, QAgent, Trainer, TrainingOutcome, evaluate_policy};
use crate::circuit::Circuit;
use crate::config::{EnvKind, ProfilesConfig, ScenarioConfig};
use crate::devices::LoadClass;
use crate::env::{Env, PvVarConfig, PvVarEnv, RestorationEnv, TrainingReport};
use crate::error::Result;
use crate::profile::{ProfileSet, TimeSeries};

/// Seed offset for the trainer RNG so exploration does not mirror the
/// environment's start draws.
const TRAINER_SEED_OFFSET: u64 = 7919;

/// File the final agent is written to when a checkpoint directory is set.
pub const FINAL_MODEL_FILE: &str = "final_model.json";

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub scenario: String,
    pub agent: QAgent,
    pub episodes: Vec<EpisodeRecord>,
    pub evaluation: Evaluation,
    pub report: TrainingReport,
}

/// Loads or synthesises the interval profiles the circuit devices read.
///
/// CSV data is resampled to the solution step and cut to the configured
/// date window. The PV history also loses its trailing sample and is
/// normalised to its peak so it can serve as irradiance.
///
/// # Errors
///
/// Returns `Error::Profile` or `Error::Csv` when a file cannot be used.
pub fn build_profiles(cfg: &ScenarioConfig) -> Result<ProfileSet> {
    let s = &cfg.simulation;
    let p = &cfg.profiles;
    let len = s.total_steps.max(s.start_index + s.episode_len) + 1;
    let mut profiles = ProfileSet::synthetic(len, s.step_minutes, s.seed)?;

    if let Some(path) = &p.pv_csv {
        let series = load_csv(path, p, s.step_minutes)?.drop_last();
        let series = window(series, p)?.normalized();
        info!(path = %path.display(), samples = series.len(), "PV profile loaded");
        profiles.irradiance = series;
    }
    for (i, path) in p.loadshape_csvs.iter().enumerate() {
        let class = LoadClass::for_position(i);
        let series = window(load_csv(path, p, s.step_minutes)?, p)?.normalized();
        info!(path = %path.display(), shape = class.shape_name(), "loadshape loaded");
        profiles.set_loadshape(class, series);
    }
    if let Some(t) = p.temperature_c {
        profiles.temperature = TimeSeries::constant("temperature", t);
    }
    if profiles.len() < s.total_steps {
        warn!(
            samples = profiles.len(),
            total_steps = s.total_steps,
            "irradiance profile is shorter than the episode window and will repeat"
        );
    }
    Ok(profiles)
}

fn load_csv(path: &Path, p: &ProfilesConfig, step_minutes: u32) -> Result<TimeSeries> {
    TimeSeries::from_csv_path(path, &p.timestamp_column, &p.value_column)?.resample(step_minutes)
}

fn window(series: TimeSeries, p: &ProfilesConfig) -> Result<TimeSeries> {
    match (p.start_date, p.end_date) {
        (None, None) => Ok(series),
        (start, end) => series.slice_dates(start.unwrap_or(NaiveDate::MIN), end.unwrap_or(NaiveDate::MAX)),
    }
}

/// Compiles the feeder and attaches the controlled PV through the
/// command language, then runs the optional user script.
///
/// # Errors
///
/// Returns the first failing command's error.
pub fn build_circuit(cfg: &ScenarioConfig, profiles: ProfileSet) -> Result<Circuit> {
    let f = &cfg.feeder;
    let mut circuit = Circuit::new(profiles);

    circuit.command(&format!("compile \"{}\"", f.circuit))?;
    let bases: Vec<String> = f.voltage_bases.iter().map(f64::to_string).collect();
    circuit.command(&format!("set voltagebases=[{}]", bases.join(",")))?;
    circuit.command("calcvoltagebases")?;

    let pv = &cfg.pv;
    if pv.enabled {
        circuit.command(&format!(
            "new pvsystem.{} bus1={} kva={} pmpp={} kvarmax={}",
            pv.name, pv.bus, pv.kva, pv.pmpp, pv.kvar_max
        ))?;
        circuit.command(&format!("~ %cutin={} %cutout={}", pv.pct_cutin, pv.pct_cutout))?;
    }

    circuit.command(&format!(
        "set mode=daily number=1 stepsize={}m",
        cfg.simulation.step_minutes
    ))?;
    circuit.command(&format!("set loadmult={}", f.load_mult))?;
    circuit.command(&format!(
        "set controlmode={} maxcontroliter={}",
        f.control_mode, f.max_control_iter
    ))?;
    if let Some(script) = &f.script {
        circuit.command(&format!("redirect \"{}\"", script.display()))?;
    }
    Ok(circuit)
}

pub fn pv_var_config(cfg: &ScenarioConfig) -> PvVarConfig {
    let s = &cfg.simulation;
    PvVarConfig {
        bus: cfg.feeder.observe_bus.clone(),
        pv: cfg.pv.name.clone(),
        action: cfg.action,
        episode_len: s.episode_len,
        total_steps: s.total_steps,
        random_start: s.random_start,
        start_index: s.start_index,
        info_decimals: s.info_decimals,
        reward: cfg.reward.clone(),
    }
}

/// Builds the scenario, trains an agent and evaluates it greedily.
///
/// # Errors
///
/// Returns configuration, profile, circuit, environment and checkpoint
/// errors.
pub fn run(cfg: &ScenarioConfig) -> Result<RunOutput> {
    let profiles = build_profiles(cfg)?;
    let circuit = build_circuit(cfg, profiles)?;
    let seed = cfg.simulation.seed;

    match cfg.simulation.environment {
        EnvKind::PvVar => {
            let env = PvVarEnv::new(circuit, pv_var_config(cfg), seed)?;
            train_and_evaluate(cfg, env)
        }
        EnvKind::Restoration => {
            let env = RestorationEnv::new(circuit, cfg.restoration.clone(), seed)?;
            train_and_evaluate(cfg, env)
        }
    }
}

fn train_and_evaluate<E: Env>(cfg: &ScenarioConfig, mut env: E) -> Result<RunOutput> {
    let mut agent = QAgent::new(&env.observation_space(), &env.action_space(), &cfg.agent)?;
    let mut trainer = Trainer::new(
        cfg.training.trainer(),
        cfg.agent.clone(),
        cfg.simulation.seed.wrapping_add(TRAINER_SEED_OFFSET),
    );

    info!(
        scenario = %cfg.name,
        timesteps = cfg.training.total_timesteps,
        actions = agent.actions().len(),
        "training started"
    );
    let TrainingOutcome {
        episodes,
        timesteps,
        best_mean_reward,
    } = trainer.learn(&mut env, &mut agent)?;
    info!(episodes = episodes.len(), timesteps, states = agent.states(), "training finished");

    if let Some(dir) = &cfg.training.checkpoint_dir {
        agent.save(&dir.join(FINAL_MODEL_FILE))?;
    }

    let evaluation = evaluate_policy(&agent, &mut env, cfg.training.eval_episodes)?;
    let outcome = TrainingOutcome {
        episodes,
        timesteps,
        best_mean_reward,
    };
    let mut report = outcome.report();
    if cfg.training.eval_episodes > 0 {
        report = report.with_evaluation(evaluation.mean_reward, evaluation.std_reward);
    }

    Ok(RunOutput {
        scenario: cfg.name.clone(),
        agent,
        episodes: outcome.episodes,
        evaluation,
        report,
    })
}
