//! Tabular learning agent and its training loop.

pub mod evaluation;
pub mod qlearning;
pub mod schedule;
pub mod trainer;

pub use evaluation::{Evaluation, StepTelemetry, evaluate_policy};
pub use qlearning::{AgentConfig, QAgent};
pub use trainer::{EpisodeRecord, Trainer, TrainerConfig, TrainingOutcome};
