use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::state::{AppState, LastSweep};

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: i64,
    pub sweep_in_progress: bool,
    pub last_sweep: Option<LastSweep>,
}

/// Liveness endpoint for the hosting platform. Always 200 while the process
/// is up; sweep failures show up in `last_sweep` rather than the status code.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        sweep_in_progress: state.sweep.in_progress(),
        last_sweep: state.sweep.last().await,
    })
}
