use std::sync::Arc;
use validator::Validate;

use crate::config::Config;
use crate::documents::DocumentCache;
use crate::weaviate::{SearchBackend, WeaviateClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn SearchBackend>,
    pub document_cache: DocumentCache,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let backend = Arc::new(WeaviateClient::from_config(&config));
        Self::with_backend(config, backend)
    }

    /// Build state around any backend (used by tests with an in-memory store)
    pub fn with_backend(config: Config, backend: Arc<dyn SearchBackend>) -> Self {
        let ttl = std::time::Duration::from_secs(config.data.document_cache_ttl_secs);
        Self {
            config,
            backend,
            document_cache: DocumentCache::new(ttl),
        }
    }
}

// Core models

/// A department partition of the collection
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TenantInfo {
    pub name: String,
    pub document_count: usize,
}

/// Uniform view over hits from every search mode
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub content: String,
    pub file_name: String,
    pub chunk_index: usize,
    pub created_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A complete markdown document read from the local data tree
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FullDocument {
    pub file_name: String,
    pub content: String,
    pub file_path: String,
    pub file_type: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchResults {
    pub documents: Vec<DocumentRecord>,
    pub total_count: usize,
    /// Mode that actually produced the documents
    pub search_type: crate::types::SearchType,
    pub query: String,
    /// True when a generative search fell back to hybrid
    #[serde(default)]
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

// API Request/Response types

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
    #[validate(length(min = 1, message = "tenant must not be empty"))]
    pub tenant: String,
    /// Wire label, parsed with `SearchType::from_str` so bad labels are a 400
    #[serde(default = "default_search_type")]
    pub search_type: String,
    #[validate(range(min = 0.0, max = 1.0, message = "alpha must be within [0.0, 1.0]"))]
    pub alpha: Option<f64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

fn default_search_type() -> String {
    crate::types::SearchType::Hybrid.to_string()
}

#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct AgentRequest {
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
    #[validate(length(min = 1, message = "tenant must not be empty"))]
    pub tenant: String,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct DocumentsQuery {
    pub filter: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub weaviate: String,
}
