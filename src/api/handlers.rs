//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{ErrorResponse, RangeQuery, StateResponse};
use crate::agent::{EpisodeRecord, StepTelemetry};

type BadRequest = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> BadRequest {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        scenario: state.scenario.clone(),
        report: state.report.clone(),
        latest_step: state.telemetry.last().cloned(),
    })
}

/// Training episodes whose 1-based number lies in `[from, to]`.
///
/// `GET /episodes?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_episodes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<EpisodeRecord>>, BadRequest> {
    let (from, to) = query.bounds().map_err(bad_request)?;
    let records = state
        .episodes
        .iter()
        .filter(|e| (from..=to).contains(&e.episode))
        .cloned()
        .collect();
    Ok(Json(records))
}

/// Evaluation telemetry rows by 0-based position in `[from, to]`.
///
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<StepTelemetry>>, BadRequest> {
    let (from, to) = query.bounds().map_err(bad_request)?;
    let rows = state
        .telemetry
        .iter()
        .skip(from)
        .take(to.saturating_sub(from).saturating_add(1))
        .cloned()
        .collect();
    Ok(Json(rows))
}
