use axum::{extract::State, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::agent::{query_agent, AgentResponse};
use crate::documents::require_known_tenant;
use crate::models::{AgentRequest, AppState};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/query-agent", post(post_query_agent))
        .with_state(state)
}

pub async fn post_query_agent(
    State(state): State<AppState>,
    Json(request): Json<AgentRequest>,
) -> AppResult<Json<AgentResponse>> {
    request.validate()?;
    require_known_tenant(&state.config.weaviate, &request.tenant)?;
    info!(tenant = %request.tenant, query = %request.query, "Received agent query");

    let response = query_agent(state.backend.as_ref(), &request.tenant, &request.query).await?;
    Ok(Json(response))
}
