//! File output for evaluation telemetry and training progress.

pub mod export;
