//! End-to-end training, checkpointing and evaluation through the runner.

mod common;

use feeder_gym::agent::trainer::BEST_MODEL_FILE;
use feeder_gym::agent::{QAgent, evaluate_policy};
use feeder_gym::runner::{self, FINAL_MODEL_FILE};

#[test]
fn restoration_run_checkpoints_a_usable_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = common::quick_restoration();
    cfg.training.checkpoint_dir = Some(dir.path().to_path_buf());

    let out = runner::run(&cfg).unwrap();
    assert_eq!(out.episodes.len(), 10);
    assert_eq!(out.report.episodes, 10);
    assert!(out.report.best_mean_reward.is_some());

    let best = QAgent::load(&dir.path().join(BEST_MODEL_FILE)).unwrap();
    let last = QAgent::load(&dir.path().join(FINAL_MODEL_FILE)).unwrap();
    assert_eq!(last.states(), out.agent.states());

    let mut env = common::restoration_env(&cfg);
    let eval = evaluate_policy(&best, &mut env, 3).unwrap();
    assert_eq!(eval.episode_rewards.len(), 3);
    assert!(eval.episode_rewards.iter().all(|r| *r > 0.0 && *r <= 5.0 + 1e-9));
}

#[test]
fn pv_run_reports_voltage_range() {
    let out = runner::run(&common::quick_ieee34()).unwrap();
    assert_eq!(out.episodes.len(), 10);
    assert!(out.episodes.iter().all(|e| e.kpi.length == 4 && e.kpi.reward <= 0.0));

    let lo = out.report.min_voltage.unwrap();
    let hi = out.report.max_voltage.unwrap();
    assert!(lo > 0.8 && lo <= hi && hi < 1.2, "{lo}..{hi}");
    assert!(out.report.to_string().starts_with("--- Training Report ---"));
}

#[test]
fn same_seed_same_run() {
    let cfg = common::quick_ieee123();
    let a = runner::run(&cfg).unwrap();
    let b = runner::run(&cfg).unwrap();
    let rewards = |o: &runner::RunOutput| o.episodes.iter().map(|e| e.kpi.reward).collect::<Vec<_>>();
    assert_eq!(rewards(&a), rewards(&b));
    assert_eq!(a.evaluation.episode_rewards, b.evaluation.episode_rewards);
}
