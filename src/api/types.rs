//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::agent::StepTelemetry;
use crate::env::TrainingReport;

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub scenario: String,
    pub report: TrainingReport,
    /// Last evaluation step, absent when no evaluation ran.
    pub latest_step: Option<StepTelemetry>,
}

/// Optional inclusive range over episode numbers or telemetry rows.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

impl RangeQuery {
    /// Inclusive bounds, or a message when `from > to`.
    pub fn bounds(&self) -> Result<(usize, usize), String> {
        let from = self.from.unwrap_or(0);
        let to = self.to.unwrap_or(usize::MAX);
        if from > to {
            return Err(format!("`from` ({from}) must be <= `to` ({to})"));
        }
        Ok((from, to))
    }
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_range_defaults() {
        assert_eq!(RangeQuery::default().bounds(), Ok((0, usize::MAX)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let q = RangeQuery {
            from: Some(10),
            to: Some(5),
        };
        assert!(q.bounds().unwrap_err().contains("must be <="));
    }
}
