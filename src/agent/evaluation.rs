//! Greedy policy evaluation.

use serde::Serialize;
use tracing::info;

use crate::env::{Env, Step};
use crate::error::Result;

use super::qlearning::QAgent;

/// One evaluation step, flattened for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTelemetry {
    pub episode: usize,
    pub step: usize,
    pub interval: Option<usize>,
    pub voltage_pu: Option<f64>,
    pub p_pu: Option<f64>,
    pub q_pu: Option<f64>,
    pub kvar_setpoint: Option<f64>,
    pub reward: f64,
    pub nameplate: Option<f64>,
    pub standard: Option<f64>,
    pub voltage_term: Option<f64>,
    pub served_kw: Option<f64>,
    pub terminated: bool,
}

impl StepTelemetry {
    pub fn from_step(episode: usize, step_index: usize, step: &Step) -> Self {
        let breakdown = step.info.reward.as_ref();
        Self {
            episode,
            step: step_index,
            interval: step.info.interval,
            voltage_pu: step.info.voltage_pu,
            p_pu: step.info.p_pu,
            q_pu: step.info.q_pu,
            kvar_setpoint: step.info.kvar_setpoint,
            reward: step.reward,
            nameplate: breakdown.map(|r| r.nameplate),
            standard: breakdown.map(|r| r.standard),
            voltage_term: breakdown.map(|r| r.voltage),
            served_kw: step.info.served_kw,
            terminated: step.terminated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub mean_reward: f64,
    /// Population standard deviation of the episode rewards.
    pub std_reward: f64,
    pub episode_rewards: Vec<f64>,
    pub telemetry: Vec<StepTelemetry>,
}

/// Runs `n_episodes` greedy episodes and scores them.
///
/// # Errors
///
/// Returns the first environment error.
pub fn evaluate_policy<E: Env>(agent: &QAgent, env: &mut E, n_episodes: usize) -> Result<Evaluation> {
    let mut rewards = Vec::with_capacity(n_episodes);
    let mut telemetry = Vec::new();

    for episode in 1..=n_episodes {
        let mut obs = env.reset(None)?.observation;
        let mut total = 0.0;
        let mut step_index = 0;
        loop {
            let step = env.step(&agent.predict(&obs))?;
            step_index += 1;
            total += step.reward;
            telemetry.push(StepTelemetry::from_step(episode, step_index, &step));
            obs = step.observation;
            if step.terminated || step.truncated {
                break;
            }
        }
        rewards.push(total);
    }

    let n = rewards.len().max(1) as f64;
    let mean = rewards.iter().sum::<f64>() / n;
    let std = (rewards.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
    info!(episodes = n_episodes, mean_reward = mean, std_reward = std, "evaluation finished");

    Ok(Evaluation {
        mean_reward: mean,
        std_reward: std,
        episode_rewards: rewards,
        telemetry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::qlearning::AgentConfig;
    use crate::agent::trainer::tests::ChainEnv;

    #[test]
    fn untrained_agent_holds_still() {
        let mut env = ChainEnv::new();
        let agent = QAgent::new(&env.observation_space(), &env.action_space(), &AgentConfig::default()).unwrap();
        let eval = evaluate_policy(&agent, &mut env, 3).unwrap();
        assert_eq!(eval.episode_rewards, vec![-6.0; 3]);
        assert_eq!(eval.mean_reward, -6.0);
        assert_eq!(eval.std_reward, 0.0);
        assert_eq!(eval.telemetry.len(), 18);
        assert!(eval.telemetry[5].terminated);
        assert_eq!(eval.telemetry[6].episode, 2);
        assert_eq!(eval.telemetry[6].step, 1);
    }

    #[test]
    fn zero_episodes() {
        let mut env = ChainEnv::new();
        let agent = QAgent::new(&env.observation_space(), &env.action_space(), &AgentConfig::default()).unwrap();
        let eval = evaluate_policy(&agent, &mut env, 0).unwrap();
        assert!(eval.episode_rewards.is_empty());
        assert_eq!(eval.mean_reward, 0.0);
    }
}
