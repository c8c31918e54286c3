use axum::{extract::State, routing::get, Json, Router};
use tracing::warn;

use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

/// Always 200; a Weaviate outage shows up as `degraded`
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let weaviate = match state.backend.connect().await {
        Ok(_session) => "connected".to_string(),
        Err(e) => {
            warn!(error = %e, "Weaviate readiness check failed");
            "unavailable".to_string()
        }
    };
    let status = if weaviate == "connected" { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        weaviate,
    })
}
