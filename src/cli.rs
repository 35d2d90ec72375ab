//! Command-line arguments and their mapping onto a scenario.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::config::{ConfigError, ScenarioConfig};

/// Preset used when neither `--scenario` nor `--preset` is given.
pub const DEFAULT_PRESET: &str = "ieee34_local_pv";

/// Trains a tabular agent on a distribution-feeder environment.
#[derive(Parser, Debug)]
#[command(name = "feeder-gym", version)]
pub struct Cli {
    /// Load the scenario from a TOML file.
    #[arg(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in preset: ieee34_local_pv, ieee123_single_pv, ieee123_restoration.
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the training step budget.
    #[arg(long)]
    pub timesteps: Option<usize>,

    /// Override the number of greedy evaluation episodes.
    #[arg(long)]
    pub eval_episodes: Option<usize>,

    /// Write evaluation step telemetry to CSV.
    #[arg(long)]
    pub telemetry_out: Option<PathBuf>,

    /// Write one CSV row per training episode.
    #[arg(long)]
    pub progress_out: Option<PathBuf>,

    /// Directory for best and final model checkpoints.
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    pub log_level: Level,

    /// Serve the finished run over HTTP.
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// API server port.
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

impl Cli {
    /// Loads the selected scenario and applies the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unreadable file or unknown preset.
    pub fn scenario(&self) -> Result<ScenarioConfig, ConfigError> {
        let mut cfg = match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
            (None, Some(name)) => ScenarioConfig::from_preset(name)?,
            (None, None) => ScenarioConfig::from_preset(DEFAULT_PRESET)?,
        };
        if let Some(seed) = self.seed {
            cfg.simulation.seed = seed;
        }
        if let Some(n) = self.timesteps {
            cfg.training.total_timesteps = n;
        }
        if let Some(n) = self.eval_episodes {
            cfg.training.eval_episodes = n;
        }
        if let Some(dir) = &self.checkpoint_dir {
            cfg.training.checkpoint_dir = Some(dir.clone());
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("feeder-gym").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_ieee34_preset() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.log_level, Level::INFO);
        let cfg = cli.scenario().unwrap();
        assert_eq!(cfg.name, DEFAULT_PRESET);
    }

    #[test]
    fn overrides_apply() {
        let cli = parse(&[
            "--preset",
            "ieee123_restoration",
            "--seed",
            "7",
            "--timesteps",
            "50",
            "--eval-episodes",
            "3",
            "--checkpoint-dir",
            "ckpt",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Level::DEBUG);
        let cfg = cli.scenario().unwrap();
        assert_eq!(cfg.name, "ieee123_restoration");
        assert_eq!(cfg.simulation.seed, 7);
        assert_eq!(cfg.training.total_timesteps, 50);
        assert_eq!(cfg.training.eval_episodes, 3);
        assert_eq!(cfg.training.checkpoint_dir, Some(PathBuf::from("ckpt")));
    }

    #[test]
    fn scenario_and_preset_conflict() {
        assert!(parse(&["--scenario", "a.toml", "--preset", "ieee34_local_pv"]).is_err());
    }

    #[test]
    fn unknown_preset_is_a_config_error() {
        let cli = parse(&["--preset", "ieee13"]).unwrap();
        assert_eq!(cli.scenario().unwrap_err().field, "preset");
    }

    #[test]
    fn bad_seed_is_rejected() {
        assert!(parse(&["--seed", "-1"]).is_err());
    }
}
