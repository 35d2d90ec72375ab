//! Episode and training KPIs computed from step results.

use std::fmt;

use serde::Serialize;

use super::types::Step;

/// Per-episode aggregates, filled one step at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeKpi {
    pub reward: f64,
    pub length: usize,
    pub voltage_violations: usize,
    pub q_violations: usize,
    pub loop_rejections: usize,
    pub min_voltage: Option<f64>,
    pub max_voltage: Option<f64>,
}

impl EpisodeKpi {
    pub fn record(&mut self, step: &Step) {
        self.reward += step.reward;
        self.length += 1;
        if let Some(r) = &step.info.reward {
            self.voltage_violations += usize::from(r.voltage_violation);
            self.q_violations += usize::from(r.q_violation);
        }
        self.loop_rejections += usize::from(step.info.loop_rejected);
        if let Some(v) = step.info.voltage_pu {
            self.min_voltage = Some(self.min_voltage.map_or(v, |m| m.min(v)));
            self.max_voltage = Some(self.max_voltage.map_or(v, |m| m.max(v)));
        }
    }
}

/// Aggregate view over a training run, printed at the end of the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub episodes: usize,
    pub timesteps: usize,
    pub mean_reward: f64,
    /// Mean reward over the last 100 episodes.
    pub recent_mean_reward: f64,
    pub best_mean_reward: Option<f64>,
    pub voltage_violations: usize,
    pub q_violations: usize,
    pub min_voltage: Option<f64>,
    pub max_voltage: Option<f64>,
    pub eval_mean_reward: Option<f64>,
    pub eval_std_reward: Option<f64>,
}

impl TrainingReport {
    /// # Arguments
    ///
    /// * `episodes` - Completed training episodes in order
    /// * `best_mean_reward` - Best 100-episode mean seen by the checkpoint check
    pub fn from_episodes(episodes: &[EpisodeKpi], best_mean_reward: Option<f64>) -> Self {
        let mean = |eps: &[EpisodeKpi]| {
            if eps.is_empty() {
                0.0
            } else {
                eps.iter().map(|e| e.reward).sum::<f64>() / eps.len() as f64
            }
        };
        let recent = &episodes[episodes.len().saturating_sub(100)..];
        Self {
            episodes: episodes.len(),
            timesteps: episodes.iter().map(|e| e.length).sum(),
            mean_reward: mean(episodes),
            recent_mean_reward: mean(recent),
            best_mean_reward,
            voltage_violations: episodes.iter().map(|e| e.voltage_violations).sum(),
            q_violations: episodes.iter().map(|e| e.q_violations).sum(),
            min_voltage: episodes.iter().filter_map(|e| e.min_voltage).reduce(f64::min),
            max_voltage: episodes.iter().filter_map(|e| e.max_voltage).reduce(f64::max),
            eval_mean_reward: None,
            eval_std_reward: None,
        }
    }

    pub fn with_evaluation(mut self, mean: f64, std: f64) -> Self {
        self.eval_mean_reward = Some(mean);
        self.eval_std_reward = Some(std);
        self
    }
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Training Report ---")?;
        writeln!(f, "Episodes:              {}", self.episodes)?;
        writeln!(f, "Timesteps:             {}", self.timesteps)?;
        writeln!(f, "Mean episode reward:   {:.4}", self.mean_reward)?;
        writeln!(f, "Last-100 mean reward:  {:.4}", self.recent_mean_reward)?;
        writeln!(f, "Best mean reward:      {}", opt(self.best_mean_reward, 4))?;
        writeln!(f, "Voltage violations:    {}", self.voltage_violations)?;
        writeln!(f, "Q violations:          {}", self.q_violations)?;
        writeln!(
            f,
            "Voltage range:         {} .. {} pu",
            opt(self.min_voltage, 4),
            opt(self.max_voltage, 4)
        )?;
        write!(
            f,
            "Evaluation reward:     {} +/- {}",
            opt(self.eval_mean_reward, 4),
            opt(self.eval_std_reward, 4)
        )
    }
}
