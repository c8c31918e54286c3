use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::documents::{fetch_documents, fetch_tenants, read_full_documents, require_known_tenant};
use crate::models::{AppState, DocumentRecord, DocumentsQuery, FullDocument, TenantInfo};
use crate::search::filter_documents_locally;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tenants", get(list_tenants))
        .route("/api/tenants/{tenant}/documents", get(list_documents))
        .route("/api/tenants/{tenant}/full-documents", get(list_full_documents))
        .with_state(state)
}

async fn list_tenants(State(state): State<AppState>) -> AppResult<Json<Vec<TenantInfo>>> {
    let tenants = fetch_tenants(state.backend.as_ref(), &state.config.weaviate.tenants).await?;
    Ok(Json(tenants))
}

async fn list_documents(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(params): Query<DocumentsQuery>,
) -> AppResult<Json<Vec<DocumentRecord>>> {
    require_known_tenant(&state.config.weaviate, &tenant)?;

    let documents = fetch_documents(state.backend.as_ref(), &state.document_cache, &tenant).await?;
    let filter = params.filter.unwrap_or_default();
    let documents = filter_documents_locally(documents, filter.trim());
    info!(tenant = %tenant, filter = %filter, count = documents.len(), "Listing documents");
    Ok(Json(documents))
}

async fn list_full_documents(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> AppResult<Json<Vec<FullDocument>>> {
    let documents = read_full_documents(
        &state.config.data.data_dir,
        &tenant,
        &state.config.weaviate.tenants,
    )
    .await?;
    Ok(Json(documents))
}
