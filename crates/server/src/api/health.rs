use axum::Json;
use axum::extract::State;
use serde::Serialize;

use mailwire_gateway::MetricsSnapshot;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub driver: String,
    pub runtime: String,
    /// `None` when the configured driver is unknown.
    pub backend: Option<String>,
    pub metrics: MetricsSnapshot,
}

/// `GET /health` -- service status together with dispatch counters.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mailer = &state.mailer;
    Json(HealthResponse {
        status: "ok",
        driver: mailer.driver().to_owned(),
        runtime: mailer.runtime().to_string(),
        backend: mailer.backend().ok().map(|b| b.to_string()),
        metrics: mailer.metrics().snapshot(),
    })
}
