//! Console view state
//!
//! The browser owns a [`ViewState`] and posts it back with every user action.
//! [`dispatch`] performs whatever service call the action needs and folds the
//! outcome into the state through [`reduce`], which is pure.
//!
//! A failed request never discards what the user was looking at: the prior
//! state is kept and an error notice is attached.

pub mod dispatch;

pub use dispatch::{dispatch, ViewAction};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::agent::AgentResponse;
use crate::documents::strip_html;
use crate::models::{DocumentRecord, FullDocument, SearchResults};
use crate::search::NO_RESULTS;

/// Chunks rendered in the chunk listing
pub const CHUNK_PREVIEW_COUNT: usize = 10;

pub const MISSING_SEARCH_INPUT: &str = "Please select a department and enter a search query.";
pub const MISSING_AGENT_INPUT: &str = "Please select a department and enter a query.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentView {
    #[default]
    Documents,
    Search,
    Agent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentView {
    #[default]
    None,
    Chunks,
    FullDocuments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Everything the console page shows, round-tripped through the browser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub selected_tenant: Option<String>,
    pub current_view: CurrentView,
    pub document_view: DocumentView,
    pub documents: Vec<DocumentRecord>,
    pub full_documents: Vec<FullDocument>,
    pub search_results: Option<SearchResults>,
    pub agent_response: Option<AgentResponse>,
    /// Indices into `full_documents` shown expanded
    pub expanded: BTreeSet<usize>,
    pub notice: Option<Notice>,

    // Derived on every reduce; ignored when the browser sends the state back
    #[serde(skip_deserializing)]
    pub chunk_caption: Option<String>,
    /// Leading entries of `documents` the chunk listing renders
    #[serde(skip_deserializing)]
    pub visible_chunk_count: usize,
    #[serde(skip_deserializing)]
    pub expanded_text: BTreeMap<usize, String>,
}

/// Outcome of a user action, ready to fold into the state
#[derive(Debug, Clone)]
pub enum ViewEvent {
    TenantSelected {
        tenant: String,
        documents: Result<Vec<DocumentRecord>, String>,
    },
    SearchCompleted(SearchResults),
    SearchFailed(String),
    SearchInputMissing,
    SearchCleared,
    AgentCompleted(AgentResponse),
    AgentFailed(String),
    AgentInputMissing,
    ChunksLoaded(Result<Vec<DocumentRecord>, String>),
    FullDocumentsLoaded(Result<Vec<FullDocument>, String>),
    ExpandToggled(usize),
    NoticeDismissed,
    /// Action refused before any service call; prior state is kept
    ActionRejected(String),
}

/// Fold one event into the state
pub fn reduce(mut state: ViewState, event: ViewEvent) -> ViewState {
    state.notice = None;

    match event {
        ViewEvent::TenantSelected { tenant, documents } => {
            state.selected_tenant = Some(tenant);
            state.search_results = None;
            state.agent_response = None;
            state.current_view = CurrentView::Documents;
            state.document_view = DocumentView::None;
            state.full_documents.clear();
            state.expanded.clear();
            match documents {
                Ok(docs) => state.documents = docs,
                Err(message) => {
                    state.documents.clear();
                    state.notice = Some(Notice::error(message));
                }
            }
        }
        ViewEvent::SearchCompleted(results) => {
            if results.documents.is_empty() {
                let message = results.notice.as_deref().unwrap_or(NO_RESULTS);
                state.notice = Some(Notice::warning(message));
            } else {
                state.notice = Some(match &results.notice {
                    Some(fallback) => Notice::warning(fallback.clone()),
                    None => Notice::success(format!("Found {} results!", results.documents.len())),
                });
                state.search_results = Some(results);
                state.current_view = CurrentView::Search;
            }
        }
        ViewEvent::SearchFailed(message)
        | ViewEvent::AgentFailed(message)
        | ViewEvent::ActionRejected(message) => {
            state.notice = Some(Notice::error(message));
        }
        ViewEvent::SearchInputMissing => {
            state.notice = Some(Notice::warning(MISSING_SEARCH_INPUT));
        }
        ViewEvent::AgentInputMissing => {
            state.notice = Some(Notice::warning(MISSING_AGENT_INPUT));
        }
        ViewEvent::SearchCleared => {
            state.search_results = None;
            state.current_view = CurrentView::Documents;
        }
        ViewEvent::AgentCompleted(response) => {
            state.agent_response = Some(response);
            state.current_view = CurrentView::Agent;
            state.notice = Some(Notice::success("Agent response generated!"));
        }
        ViewEvent::ChunksLoaded(Ok(docs)) => {
            state.documents = docs;
            state.document_view = DocumentView::Chunks;
            state.current_view = CurrentView::Documents;
        }
        ViewEvent::FullDocumentsLoaded(Ok(docs)) => {
            state.full_documents = docs;
            state.expanded.clear();
            state.document_view = DocumentView::FullDocuments;
            state.current_view = CurrentView::Documents;
        }
        ViewEvent::ChunksLoaded(Err(message)) | ViewEvent::FullDocumentsLoaded(Err(message)) => {
            state.notice = Some(Notice::error(message));
        }
        ViewEvent::ExpandToggled(index) => {
            if index < state.full_documents.len() && !state.expanded.remove(&index) {
                state.expanded.insert(index);
            }
        }
        ViewEvent::NoticeDismissed => {}
    }

    refresh_derived(&mut state);
    state
}

fn refresh_derived(state: &mut ViewState) {
    state.visible_chunk_count = state.documents.len().min(CHUNK_PREVIEW_COUNT);
    state.chunk_caption = match state.document_view {
        DocumentView::Chunks if state.documents.len() > CHUNK_PREVIEW_COUNT => Some(format!(
            "Showing first {} of {} documents.",
            CHUNK_PREVIEW_COUNT,
            state.documents.len()
        )),
        _ => None,
    };

    let loaded = state.full_documents.len();
    state.expanded.retain(|i| *i < loaded);
    state.expanded_text = state
        .expanded
        .iter()
        .map(|&i| (i, strip_html(&state.full_documents[i].content)))
        .collect();
}
