//! Training loop with best-model checkpointing.

use std::fs;
use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::env::{Env, EpisodeKpi, TrainingReport};
use crate::error::Result;

use super::qlearning::{AgentConfig, QAgent};
use super::schedule::{EpsilonSchedule, LinearSchedule};

/// File written under the checkpoint directory on each improvement.
pub const BEST_MODEL_FILE: &str = "best_model.json";

/// Episodes averaged by the best-model check.
const MEAN_WINDOW: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    pub total_timesteps: usize,
    /// Steps between best-model checks.
    pub check_freq: usize,
    /// Episodes between progress log lines.
    pub log_interval: usize,
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            total_timesteps: 10_000,
            check_freq: 1000,
            log_interval: 10,
            checkpoint_dir: None,
        }
    }
}

/// One completed training episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeRecord {
    /// 1-based episode number.
    pub episode: usize,
    /// Total steps taken when the episode ended.
    pub timesteps: usize,
    /// Exploration rate at the episode's last step.
    pub epsilon: f64,
    pub kpi: EpisodeKpi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    pub episodes: Vec<EpisodeRecord>,
    pub timesteps: usize,
    pub best_mean_reward: Option<f64>,
}

impl TrainingOutcome {
    pub fn report(&self) -> TrainingReport {
        let kpis: Vec<EpisodeKpi> = self.episodes.iter().map(|e| e.kpi.clone()).collect();
        TrainingReport::from_episodes(&kpis, self.best_mean_reward)
    }
}

/// Drives an agent through an environment for a fixed step budget.
pub struct Trainer {
    config: TrainerConfig,
    agent_config: AgentConfig,
    rng: StdRng,
}

impl Trainer {
    pub fn new(config: TrainerConfig, agent_config: AgentConfig, seed: u64) -> Self {
        Self {
            config,
            agent_config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Trains `agent` for `total_timesteps` steps.
    ///
    /// Every `check_freq` steps the mean reward of the last 100 finished
    /// episodes is compared with the best so far; an improvement saves the
    /// agent to `best_model.json` when a checkpoint directory is set. An
    /// episode still running when the budget ends is not recorded.
    ///
    /// # Errors
    ///
    /// Returns environment errors and checkpoint I/O errors.
    pub fn learn<E: Env>(&mut self, env: &mut E, agent: &mut QAgent) -> Result<TrainingOutcome> {
        let total = self.config.total_timesteps;
        let cfg = &self.agent_config;
        let lr_schedule = LinearSchedule::new(cfg.learning_rate);
        let eps_schedule = EpsilonSchedule::new(
            cfg.exploration_initial_eps,
            cfg.exploration_final_eps,
            cfg.exploration_fraction,
        );
        if let Some(dir) = &self.config.checkpoint_dir {
            fs::create_dir_all(dir)?;
        }

        let mut episodes: Vec<EpisodeRecord> = Vec::new();
        let mut best: Option<f64> = None;
        let mut kpi = EpisodeKpi::default();
        let mut obs = env.reset(None)?.observation;

        for t in 0..total {
            let remaining = 1.0 - t as f64 / total as f64;
            let epsilon = eps_schedule.value(remaining);
            let learning = t >= cfg.learning_starts;

            // 1. Act
            let a = if learning {
                agent.select(&obs, epsilon, &mut self.rng)
            } else {
                agent.select(&obs, 1.0, &mut self.rng)
            };
            let step = env.step(&agent.action(a))?;

            // 2. Learn
            if learning {
                let lr = if cfg.linear_lr {
                    lr_schedule.value(remaining)
                } else {
                    cfg.learning_rate
                };
                agent.update(&obs, a, step.reward, &step.observation, step.terminated, lr);
            }
            kpi.record(&step);
            obs = step.observation;

            // 3. Episode bookkeeping
            if step.terminated || step.truncated {
                episodes.push(EpisodeRecord {
                    episode: episodes.len() + 1,
                    timesteps: t + 1,
                    epsilon,
                    kpi: std::mem::take(&mut kpi),
                });
                if self.config.log_interval > 0 && episodes.len() % self.config.log_interval == 0 {
                    let last = &episodes[episodes.len() - 1];
                    info!(
                        episode = last.episode,
                        timesteps = last.timesteps,
                        reward = last.kpi.reward,
                        epsilon,
                        states = agent.states(),
                        "training progress"
                    );
                }
                obs = env.reset(None)?.observation;
            }

            // 4. Best-model check
            if self.config.check_freq > 0 && (t + 1) % self.config.check_freq == 0 && !episodes.is_empty() {
                let mean = recent_mean(&episodes);
                debug!(timesteps = t + 1, mean, best = ?best, "best-model check");
                if best.is_none_or(|b| mean > b) {
                    best = Some(mean);
                    info!(timesteps = t + 1, mean_reward = mean, "new best mean reward");
                    if let Some(dir) = &self.config.checkpoint_dir {
                        agent.save(&dir.join(BEST_MODEL_FILE))?;
                    }
                }
            }
        }

        Ok(TrainingOutcome {
            episodes,
            timesteps: total,
            best_mean_reward: best,
        })
    }
}

fn recent_mean(episodes: &[EpisodeRecord]) -> f64 {
    let recent = &episodes[episodes.len().saturating_sub(MEAN_WINDOW)..];
    recent.iter().map(|e| e.kpi.reward).sum::<f64>() / recent.len() as f64
}
