//! REST API over a finished training run.
//!
//! Provides three GET endpoints:
//! - `/state`: scenario name, training report and the last evaluation step
//! - `/episodes`: training episode records with optional range filtering
//! - `/telemetry`: evaluation step telemetry with optional range filtering

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::agent::{EpisodeRecord, StepTelemetry};
use crate::env::TrainingReport;
use crate::error::Result;
use crate::runner::RunOutput;

pub use types::{ErrorResponse, RangeQuery, StateResponse};

/// Read-only application state shared across all request handlers.
pub struct AppState {
    pub scenario: String,
    pub report: TrainingReport,
    /// Completed training episodes in order.
    pub episodes: Vec<EpisodeRecord>,
    /// Evaluation rollouts, one row per step.
    pub telemetry: Vec<StepTelemetry>,
}

impl From<RunOutput> for AppState {
    fn from(out: RunOutput) -> Self {
        Self {
            scenario: out.scenario,
            report: out.report,
            episodes: out.episodes,
            telemetry: out.evaluation.telemetry,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/episodes", get(handlers::get_episodes))
        .route("/telemetry", get(handlers::get_telemetry))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process exits.
///
/// # Errors
///
/// Returns `Error::Io` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
