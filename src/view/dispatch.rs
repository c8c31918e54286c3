// Turns a user action into a service call and folds the outcome into the view

use serde::Deserialize;
use tracing::{info, warn};

use super::{reduce, ViewEvent, ViewState};
use crate::agent::query_agent;
use crate::documents::{fetch_documents, read_full_documents};
use crate::models::AppState;
use crate::search::{filter_documents_locally, search_documents, SearchMode, DEFAULT_LIMIT};
use crate::types::SearchType;

/// Something the user did on the console page
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewAction {
    SelectTenant {
        tenant: String,
    },
    Search {
        query: String,
        #[serde(default = "default_search_type")]
        search_type: SearchType,
        #[serde(default)]
        alpha: Option<f64>,
    },
    ClearSearch,
    QueryAgent {
        query: String,
    },
    ShowChunks {
        #[serde(default)]
        filter: Option<String>,
    },
    ShowFullDocuments,
    ToggleExpanded {
        index: usize,
    },
    DismissNotice,
}

fn default_search_type() -> SearchType {
    SearchType::Hybrid
}

/// Apply one action to the browser's view state
///
/// Never fails: request errors become an error notice on the returned state.
pub async fn dispatch(app: &AppState, state: ViewState, action: ViewAction) -> ViewState {
    // A tenant the server does not know is treated as no selection
    let selected = match state.selected_tenant.clone() {
        Some(tenant) if !app.config.weaviate.is_known_tenant(&tenant) => {
            warn!(tenant = %tenant, "Ignoring unknown tenant in view state");
            None
        }
        other => other,
    };

    let event = match action {
        ViewAction::SelectTenant { tenant } if !app.config.weaviate.is_known_tenant(&tenant) => {
            warn!(tenant = %tenant, "Rejected unknown tenant");
            ViewEvent::ActionRejected(format!("Unknown department: {}", tenant))
        }

        ViewAction::SelectTenant { tenant } => {
            info!(tenant = %tenant, "Tenant selected");
            let documents = fetch_documents(app.backend.as_ref(), &app.document_cache, &tenant)
                .await
                .map_err(|e| e.to_string());
            ViewEvent::TenantSelected { tenant, documents }
        }

        ViewAction::Search { query, search_type, alpha } => {
            let query = query.trim().to_string();
            match selected {
                Some(tenant) if !query.is_empty() => {
                    run_search(app, &tenant, &query, search_type, alpha).await
                }
                _ => ViewEvent::SearchInputMissing,
            }
        }

        ViewAction::ClearSearch => ViewEvent::SearchCleared,

        ViewAction::QueryAgent { query } => {
            let query = query.trim().to_string();
            match selected {
                Some(tenant) if !query.is_empty() => {
                    match query_agent(app.backend.as_ref(), &tenant, &query).await {
                        Ok(response) => ViewEvent::AgentCompleted(response),
                        Err(e) => ViewEvent::AgentFailed(format!(
                            "Agent query failed. Please try again. ({})",
                            e
                        )),
                    }
                }
                _ => ViewEvent::AgentInputMissing,
            }
        }

        ViewAction::ShowChunks { filter } => match selected {
            Some(tenant) => {
                let loaded = fetch_documents(app.backend.as_ref(), &app.document_cache, &tenant)
                    .await
                    .map(|docs| filter_documents_locally(docs, filter.as_deref().unwrap_or("")))
                    .map_err(|e| e.to_string());
                ViewEvent::ChunksLoaded(loaded)
            }
            None => ViewEvent::ChunksLoaded(Err("Please select a department first.".to_string())),
        },

        ViewAction::ShowFullDocuments => match selected {
            Some(tenant) => {
                let loaded = read_full_documents(
                    &app.config.data.data_dir,
                    &tenant,
                    &app.config.weaviate.tenants,
                )
                .await
                .map_err(|e| {
                    warn!(tenant = %tenant, error = %e, "Error reading full documents");
                    format!("Error reading full documents: {}", e)
                });
                ViewEvent::FullDocumentsLoaded(loaded)
            }
            None => ViewEvent::FullDocumentsLoaded(Err("Please select a department first.".to_string())),
        },

        ViewAction::ToggleExpanded { index } => ViewEvent::ExpandToggled(index),

        ViewAction::DismissNotice => ViewEvent::NoticeDismissed,
    };

    reduce(state, event)
}

async fn run_search(
    app: &AppState,
    tenant: &str,
    query: &str,
    search_type: SearchType,
    alpha: Option<f64>,
) -> ViewEvent {
    let mode = match SearchMode::from_request(search_type, alpha) {
        Ok(mode) => mode,
        Err(e) => return ViewEvent::SearchFailed(e.to_string()),
    };

    match search_documents(
        app.backend.as_ref(),
        &app.config.llm,
        tenant,
        query,
        mode,
        DEFAULT_LIMIT,
    )
    .await
    {
        Ok(outcome) => ViewEvent::SearchCompleted(outcome.into_results(query)),
        Err(e) => ViewEvent::SearchFailed(format!("Search failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::view::{CurrentView, DocumentView, NoticeLevel, MISSING_SEARCH_INPUT};
    use crate::weaviate::testing::FakeBackend;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn app(backend: FakeBackend, data_dir: &std::path::Path) -> AppState {
        let mut config = Config::default();
        config.data.data_dir = data_dir.to_path_buf();
        AppState::with_backend(config, Arc::new(backend))
    }

    #[test]
    fn test_action_wire_format() {
        let action: ViewAction = serde_json::from_str(
            r#"{"type":"search","query":"leave","search_type":"keyword"}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            ViewAction::Search { query: "leave".into(), search_type: SearchType::Keyword, alpha: None }
        );

        let action: ViewAction = serde_json::from_str(r#"{"type":"toggle_expanded","index":2}"#).unwrap();
        assert_eq!(action, ViewAction::ToggleExpanded { index: 2 });
    }

    #[tokio::test]
    async fn test_select_then_search() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend::with_objects("HR", &["Leave policy", "Benefits guide"]);
        let app = app(backend.clone(), dir.path());

        let state = dispatch(
            &app,
            ViewState::default(),
            ViewAction::SelectTenant { tenant: "HR".into() },
        )
        .await;
        assert_eq!(state.documents.len(), 2);

        let state = dispatch(
            &app,
            state,
            ViewAction::Search { query: " leave ".into(), search_type: SearchType::Hybrid, alpha: Some(0.7) },
        )
        .await;
        assert_eq!(state.current_view, CurrentView::Search);
        assert!(backend.calls().contains(&"hybrid:HR:leave:0.7:20".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_tenant_never_reaches_backend() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend::with_objects("HR", &["Leave policy"]);
        let app = app(backend.clone(), dir.path());

        let state = dispatch(
            &app,
            ViewState::default(),
            ViewAction::SelectTenant { tenant: "HR".into() },
        )
        .await;
        let state = dispatch(&app, state, ViewAction::SelectTenant { tenant: "Legal".into() }).await;
        assert_eq!(state.selected_tenant.as_deref(), Some("HR"));
        assert_eq!(state.documents.len(), 1);
        let notice = state.notice.clone().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Unknown department: Legal");

        let forged = ViewState { selected_tenant: Some("Legal".into()), ..Default::default() };
        let state = dispatch(
            &app,
            forged,
            ViewAction::Search { query: "x".into(), search_type: SearchType::Keyword, alpha: None },
        )
        .await;
        assert_eq!(state.notice.unwrap().message, MISSING_SEARCH_INPUT);
        assert_eq!(backend.calls(), vec!["fetch:HR:50"]);
    }

    #[tokio::test]
    async fn test_search_without_tenant_is_rejected_locally() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend::with_objects("HR", &["x"]);
        let app = app(backend.clone(), dir.path());

        let state = dispatch(
            &app,
            ViewState::default(),
            ViewAction::Search { query: "x".into(), search_type: SearchType::Keyword, alpha: None },
        )
        .await;
        assert_eq!(state.notice.unwrap().message, MISSING_SEARCH_INPUT);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_alpha_never_reaches_backend() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend::with_objects("HR", &["x"]);
        let app = app(backend.clone(), dir.path());
        let state = ViewState { selected_tenant: Some("HR".into()), ..Default::default() };

        let state = dispatch(
            &app,
            state,
            ViewAction::Search { query: "x".into(), search_type: SearchType::Hybrid, alpha: Some(1.5) },
        )
        .await;
        assert_eq!(state.notice.unwrap().level, NoticeLevel::Error);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_agent_failure_keeps_search_results() {
        let dir = TempDir::new().unwrap();
        let backend = FakeBackend::with_objects("HR", &["x"]);
        let app = app(backend, dir.path());
        let state = ViewState { selected_tenant: Some("HR".into()), ..Default::default() };

        let state = dispatch(
            &app,
            state,
            ViewAction::Search { query: "x".into(), search_type: SearchType::Vector, alpha: None },
        )
        .await;
        let prior = state.search_results.clone();
        assert!(prior.is_some());

        let state = dispatch(&app, state, ViewAction::QueryAgent { query: "why".into() }).await;
        assert_eq!(state.search_results, prior);
        let notice = state.notice.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("Agent query failed."));
    }

    #[tokio::test]
    async fn test_show_full_documents_and_filtered_chunks() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("HR")).unwrap();
        std::fs::write(dir.path().join("HR").join("handbook.md"), "<b>Hi</b>").unwrap();
        let backend = FakeBackend::with_objects("HR", &["Payroll dates", "Leave policy"]);
        let app = app(backend, dir.path());
        let state = ViewState { selected_tenant: Some("HR".into()), ..Default::default() };

        let state = dispatch(&app, state, ViewAction::ShowFullDocuments).await;
        assert_eq!(state.document_view, DocumentView::FullDocuments);
        assert_eq!(state.full_documents.len(), 1);

        let state = dispatch(&app, state, ViewAction::ToggleExpanded { index: 0 }).await;
        assert_eq!(state.expanded_text.get(&0).map(String::as_str), Some("Hi"));

        let state = dispatch(
            &app,
            state,
            ViewAction::ShowChunks { filter: Some("payroll".into()) },
        )
        .await;
        assert_eq!(state.document_view, DocumentView::Chunks);
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.documents[0].content, "Payroll dates");
    }
}
