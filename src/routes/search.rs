use axum::{extract::State, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::documents::require_known_tenant;
use crate::models::{AppState, SearchRequest, SearchResults};
use crate::search::{search_documents, SearchMode, DEFAULT_LIMIT};
use crate::types::{AppResult, SearchType};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", post(post_search))
        .with_state(state)
}

pub async fn post_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<SearchResults>> {
    request.validate()?;
    let search_type: SearchType = request.search_type.parse()?;
    // validator's range check lets NaN through
    let mode = SearchMode::from_request(search_type, request.alpha)?;
    require_known_tenant(&state.config.weaviate, &request.tenant)?;

    info!(
        tenant = %request.tenant,
        query = %request.query,
        search_type = %search_type,
        "Received search request"
    );

    let outcome = search_documents(
        state.backend.as_ref(),
        &state.config.llm,
        &request.tenant,
        &request.query,
        mode,
        request.limit.unwrap_or(DEFAULT_LIMIT),
    )
    .await?;

    Ok(Json(outcome.into_results(&request.query)))
}
