use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::http::ServerState;

/// Body of the `/health` endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
}

pub async fn ping_handler() -> &'static str {
    trace!("Ping received");
    "pong"
}

pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
