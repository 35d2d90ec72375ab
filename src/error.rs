//! Library-wide error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("profile {source_name}: {message}")]
    Profile { source_name: String, message: String },
    #[error("command `{command}`: {message}")]
    Command { command: String, message: String },
    #[error("{kind} `{name}` not found in circuit")]
    UnknownElement { kind: &'static str, name: String },
    #[error("power flow did not converge after {iterations} iterations (mismatch {mismatch:.3e} pu)")]
    NotConverged { iterations: usize, mismatch: f64 },
    #[error("circuit has no solution; compile a feeder and solve first")]
    NotSolved,
    #[error("closed switches form a loop through bus `{bus}`")]
    MeshedTopology { bus: String },
    #[error("step() called while episode is {state}; call reset() first")]
    EpisodeNotRunning { state: &'static str },
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("cannot read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn profile(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Profile {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }
}
