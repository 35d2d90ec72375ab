//! Reinforcement-learning harnesses around a distribution-feeder power flow.
//!
//! A [`circuit::Circuit`] is driven through a small command language and
//! wrapped in episode environments ([`env::PvVarEnv`] for PV reactive-power
//! control, [`env::RestorationEnv`] for switch restoration) that a tabular
//! [`agent::QAgent`] is trained on.

pub mod agent;
pub mod circuit;
pub mod cli;
pub mod config;
pub mod devices;
pub mod env;
pub mod error;
pub mod io;
pub mod logging;
pub mod profile;
pub mod runner;

#[cfg(feature = "api")]
pub mod api;

pub use error::{Error, Result};
