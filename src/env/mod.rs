//! Episode environments around the circuit simulator.

pub mod episode;
pub mod grid;
pub mod kpi;
pub mod pv_var;
pub mod restoration;
pub mod reward;
pub mod types;

pub use episode::{EpisodeCounter, EpisodeState};
pub use grid::{GridSimulator, PvReading, SwitchableGrid};
pub use kpi::{EpisodeKpi, TrainingReport};
pub use pv_var::{ActionMode, PvVarConfig, PvVarEnv};
pub use restoration::{RestorationConfig, RestorationEnv};
pub use reward::{RewardBreakdown, RewardConfig, RewardVariant};
pub use types::{Action, ActionSpace, Env, Info, ObservationSpace, Reset, Step};
