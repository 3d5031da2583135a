use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::domain::relay::ProbeStatus;
use crate::infrastructure::gateway::ConnectionRegistry;

/// GET /health - process liveness
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /api/health - liveness probe used by clients before a batch
pub async fn probe(State(registry): State<Arc<ConnectionRegistry>>) -> Json<ProbeStatus> {
    Json(ProbeStatus::ok(registry.open_count()))
}
