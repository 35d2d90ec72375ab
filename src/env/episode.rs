//! Episode lifecycle shared by every environment.

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeState {
    /// Constructed, never reset.
    Idle,
    Running,
    /// Step budget reached; needs a reset.
    Terminated,
}

impl EpisodeState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Terminated => "terminated",
        }
    }
}

/// Step counter with an explicit terminal flag.
///
/// `reset` zeroes the counter; each `advance` adds exactly one and the
/// episode terminates when the counter equals the episode length.
///
/// ```
/// use feeder_gym::env::episode::{EpisodeCounter, EpisodeState};
///
/// let mut counter = EpisodeCounter::new(2);
/// assert!(counter.advance().is_err());
/// counter.reset();
/// assert_eq!(counter.advance().ok(), Some(false));
/// assert_eq!(counter.advance().ok(), Some(true));
/// assert_eq!(counter.state(), EpisodeState::Terminated);
/// ```
#[derive(Debug, Clone)]
pub struct EpisodeCounter {
    len: usize,
    step: usize,
    state: EpisodeState,
}

impl EpisodeCounter {
    /// A zero length is treated as one step.
    pub fn new(len: usize) -> Self {
        Self {
            len: len.max(1),
            step: 0,
            state: EpisodeState::Idle,
        }
    }

    pub fn reset(&mut self) {
        self.step = 0;
        self.state = EpisodeState::Running;
    }

    /// Fails unless the episode is running.
    pub fn ensure_running(&self) -> Result<()> {
        match self.state {
            EpisodeState::Running => Ok(()),
            state => Err(Error::EpisodeNotRunning {
                state: state.as_str(),
            }),
        }
    }

    /// Counts one step and returns whether the episode just terminated.
    pub fn advance(&mut self) -> Result<bool> {
        self.ensure_running()?;
        self.step += 1;
        if self.step == self.len {
            self.state = EpisodeState::Terminated;
        }
        Ok(self.state == EpisodeState::Terminated)
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn episode_len(&self) -> usize {
        self.len
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }
}
