use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::AppState;
use crate::view::{dispatch, ViewAction, ViewState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/view", post(post_view))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    #[serde(default)]
    pub state: ViewState,
    pub action: ViewAction,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub state: ViewState,
}

/// Apply a console action; failures come back as a notice on the state
pub async fn post_view(
    State(app): State<AppState>,
    Json(request): Json<ViewRequest>,
) -> Json<ViewResponse> {
    debug!(action = ?request.action, "Applying view action");
    let state = dispatch(&app, request.state, request.action).await;
    Json(ViewResponse { state })
}
