//! API Routes
//!
//! This module organizes all HTTP endpoints for the console:
//! - `/api/health` - Health check including Weaviate readiness
//! - `/api/tenants` - Departments, their chunk listings and full documents
//! - `/api/search` - Keyword, vector, hybrid and generative search
//! - `/api/query-agent` - Agentic queries with a formatted report
//! - `/api/view` - Console view-state transitions
//! - `/` - The console page, `/assets` static files

pub mod agent;
pub mod health;
pub mod search;
pub mod static_files;
pub mod tenants;
pub mod ui;
pub mod view;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
///
/// API routes are prefixed with `/api/`; the console page is served at `/`
/// and anything else falls through to the static directory.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();
    let static_dir = state.config.data.static_dir.clone();

    let api_router = Router::new()
        .merge(health::router(state.clone()))
        .merge(tenants::router(state.clone()))
        .merge(search::router(state.clone()))
        .merge(agent::router(state.clone()))
        .merge(view::router(state));

    let router = Router::new()
        .merge(api_router)
        .merge(ui::router())
        .merge(static_files::router(&static_dir))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &origins)
}
