//! Search Module
//!
//! One request wrapper per search mode, all running against a tenant of the
//! configured collection:
//! - keyword: bm25
//! - vector: nearText
//! - hybrid: weighted bm25 + vector, blend weight `alpha` in [0.0, 1.0]
//! - generative: nearText with a grouped generation over the hits
//!
//! ## Generative fallback
//!
//! Generative search is a two-step pipeline. Step one asks the service for a
//! grouped answer. If that errors or comes back without text, step two runs a
//! hybrid search (alpha 0.5, limit 10) and the outcome is tagged
//! [`SearchOutcome::FallbackHybrid`].

pub mod filter;
pub mod normalize;

pub use filter::filter_documents_locally;

use tracing::{error, info, warn};

use crate::config::LLMConfig;
use crate::models::{DocumentRecord, SearchResults};
use crate::types::{AppError, AppResult, SearchType};
use crate::weaviate::{BackendSession, GenerateRequest, GenerativeProvider, SearchBackend};
use normalize::NamePrefix;

pub const DEFAULT_LIMIT: usize = 20;
pub const GENERATIVE_LIMIT: usize = 5;
pub const FALLBACK_ALPHA: f64 = 0.5;
pub const FALLBACK_LIMIT: usize = 10;

pub const NO_RESULTS: &str = "No results found. Try a different query.";

/// A validated search mode, carrying the blend weight for hybrid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchMode {
    Keyword,
    Vector,
    Hybrid { alpha: f64 },
    Generative,
}

impl SearchMode {
    /// Hybrid mode with a blend weight; NaN and values outside [0.0, 1.0] are rejected
    pub fn hybrid(alpha: f64) -> AppResult<Self> {
        if (0.0..=1.0).contains(&alpha) {
            Ok(SearchMode::Hybrid { alpha })
        } else {
            Err(AppError::InvalidRequest(format!(
                "alpha must be within [0.0, 1.0], got {}",
                alpha
            )))
        }
    }

    /// Build from the wire label. `alpha` only matters for hybrid and defaults to 0.5.
    pub fn from_request(search_type: SearchType, alpha: Option<f64>) -> AppResult<Self> {
        match search_type {
            SearchType::Keyword => Ok(SearchMode::Keyword),
            SearchType::Vector => Ok(SearchMode::Vector),
            SearchType::Hybrid => SearchMode::hybrid(alpha.unwrap_or(FALLBACK_ALPHA)),
            SearchType::Generative => Ok(SearchMode::Generative),
        }
    }

    pub fn search_type(&self) -> SearchType {
        match self {
            SearchMode::Keyword => SearchType::Keyword,
            SearchMode::Vector => SearchType::Vector,
            SearchMode::Hybrid { .. } => SearchType::Hybrid,
            SearchMode::Generative => SearchType::Generative,
        }
    }
}

/// Why a generative search was answered by hybrid instead
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    GenerationFailed(String),
    NoGeneratedText,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::GenerationFailed(msg) => write!(f, "generation failed: {}", msg),
            FallbackReason::NoGeneratedText => write!(f, "no generated text returned"),
        }
    }
}

/// Result of a search, one case per mode plus the named fallback
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Keyword(Vec<DocumentRecord>),
    Vector(Vec<DocumentRecord>),
    Hybrid(Vec<DocumentRecord>),
    Generative(DocumentRecord),
    FallbackHybrid {
        documents: Vec<DocumentRecord>,
        reason: FallbackReason,
    },
}

impl SearchOutcome {
    pub fn documents(&self) -> &[DocumentRecord] {
        match self {
            SearchOutcome::Keyword(docs)
            | SearchOutcome::Vector(docs)
            | SearchOutcome::Hybrid(docs)
            | SearchOutcome::FallbackHybrid {
                documents: docs, ..
            } => docs.as_slice(),
            SearchOutcome::Generative(doc) => std::slice::from_ref(doc),
        }
    }

    /// Mode that actually produced the documents
    pub fn search_type(&self) -> SearchType {
        match self {
            SearchOutcome::Keyword(_) => SearchType::Keyword,
            SearchOutcome::Vector(_) => SearchType::Vector,
            SearchOutcome::Hybrid(_) | SearchOutcome::FallbackHybrid { .. } => SearchType::Hybrid,
            SearchOutcome::Generative(_) => SearchType::Generative,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SearchOutcome::FallbackHybrid { .. })
    }

    pub fn into_results(self, query: &str) -> SearchResults {
        let search_type = self.search_type();
        let (documents, fallback, notice) = match self {
            SearchOutcome::Keyword(docs) | SearchOutcome::Vector(docs) | SearchOutcome::Hybrid(docs) => {
                (docs, false, None)
            }
            SearchOutcome::Generative(doc) => (vec![doc], false, None),
            SearchOutcome::FallbackHybrid { documents, reason } => (
                documents,
                true,
                Some(format!(
                    "Generative search failed ({}), falling back to hybrid search",
                    reason
                )),
            ),
        };

        let notice = match notice {
            None if documents.is_empty() => Some(NO_RESULTS.to_string()),
            Some(fallback) if documents.is_empty() => Some(format!("{}. {}", fallback, NO_RESULTS)),
            other => other,
        };

        SearchResults {
            total_count: documents.len(),
            documents,
            search_type,
            query: query.to_string(),
            fallback,
            notice,
        }
    }
}

/// Prompts and provider settings for generative mode
pub fn generate_request(query: &str, llm: &LLMConfig) -> GenerateRequest {
    GenerateRequest {
        query: query.to_string(),
        limit: GENERATIVE_LIMIT,
        single_prompt: format!(
            "Based on the following context, answer the question: {}",
            query
        ),
        grouped_task: "Summarize the key points from the search results".to_string(),
        provider: GenerativeProvider {
            model: llm.generative_model.clone(),
            max_tokens: llm.generative_max_tokens,
            temperature: llm.generative_temperature,
        },
    }
}

/// Run one search against a tenant over a fresh session
pub async fn search_documents(
    backend: &dyn SearchBackend,
    llm: &LLMConfig,
    tenant: &str,
    query: &str,
    mode: SearchMode,
    limit: usize,
) -> AppResult<SearchOutcome> {
    let session = backend.connect().await.map_err(|e| {
        error!(tenant = %tenant, query = %query, error = %e, "Failed to connect to Weaviate");
        AppError::from(e)
    })?;

    let outcome = run_mode(session.as_ref(), llm, tenant, query, mode, limit).await;
    match &outcome {
        Ok(outcome) => info!(
            tenant = %tenant,
            query = %query,
            search_type = %outcome.search_type(),
            count = outcome.documents().len(),
            fallback = outcome.is_fallback(),
            "Search completed"
        ),
        Err(e) => error!(tenant = %tenant, query = %query, error = %e, "Search failed"),
    }
    outcome
}

async fn run_mode(
    session: &dyn BackendSession,
    llm: &LLMConfig,
    tenant: &str,
    query: &str,
    mode: SearchMode,
    limit: usize,
) -> AppResult<SearchOutcome> {
    let prefix = NamePrefix::SearchResult;
    match mode {
        SearchMode::Keyword => {
            let objects = session.bm25(tenant, query, limit).await?;
            Ok(SearchOutcome::Keyword(normalize::to_records(&objects, prefix)))
        }
        SearchMode::Vector => {
            let objects = session.near_text(tenant, query, limit).await?;
            Ok(SearchOutcome::Vector(normalize::to_records(&objects, prefix)))
        }
        SearchMode::Hybrid { alpha } => {
            let objects = session.hybrid(tenant, query, alpha, limit).await?;
            Ok(SearchOutcome::Hybrid(normalize::to_records(&objects, prefix)))
        }
        SearchMode::Generative => match generative_step(session, llm, tenant, query).await {
            Ok(record) => Ok(SearchOutcome::Generative(record)),
            Err(reason) => fallback_step(session, tenant, query, reason).await,
        },
    }
}

/// Step one: grouped generation over nearText hits
async fn generative_step(
    session: &dyn BackendSession,
    llm: &LLMConfig,
    tenant: &str,
    query: &str,
) -> Result<DocumentRecord, FallbackReason> {
    let request = generate_request(query, llm);
    match session.generate(tenant, &request).await {
        Ok(response) => match response.generated {
            Some(text) => Ok(normalize::generated_record(
                &text,
                chrono::Local::now().date_naive(),
            )),
            None => Err(FallbackReason::NoGeneratedText),
        },
        Err(e) => Err(FallbackReason::GenerationFailed(e.to_string())),
    }
}

/// Step two: hybrid search standing in for the failed generation
async fn fallback_step(
    session: &dyn BackendSession,
    tenant: &str,
    query: &str,
    reason: FallbackReason,
) -> AppResult<SearchOutcome> {
    warn!(
        tenant = %tenant,
        query = %query,
        reason = %reason,
        "Generative search failed, falling back to hybrid search"
    );
    let objects = session
        .hybrid(tenant, query, FALLBACK_ALPHA, FALLBACK_LIMIT)
        .await
        .map_err(|e| {
            error!(tenant = %tenant, query = %query, error = %e, "Fallback search also failed");
            AppError::from(e)
        })?;
    Ok(SearchOutcome::FallbackHybrid {
        documents: normalize::to_records(&objects, NamePrefix::SearchResult),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::weaviate::testing::FakeBackend;
    use std::sync::atomic::Ordering;

    fn llm() -> LLMConfig {
        Config::default().llm
    }

    #[test]
    fn test_hybrid_alpha_bounds() {
        assert!(SearchMode::hybrid(0.0).is_ok());
        assert!(SearchMode::hybrid(1.0).is_ok());
        assert!(SearchMode::hybrid(-0.01).is_err());
        assert!(SearchMode::hybrid(1.01).is_err());
        assert!(SearchMode::hybrid(f64::NAN).is_err());
    }

    #[test]
    fn test_alpha_ignored_outside_hybrid() {
        assert_eq!(
            SearchMode::from_request(SearchType::Keyword, Some(7.0)).unwrap(),
            SearchMode::Keyword
        );
        assert_eq!(
            SearchMode::from_request(SearchType::Hybrid, None).unwrap(),
            SearchMode::Hybrid { alpha: 0.5 }
        );
        assert!(SearchMode::from_request(SearchType::Hybrid, Some(2.0)).is_err());
    }

    #[tokio::test]
    async fn test_hybrid_search_passes_alpha_through() {
        let backend = FakeBackend::with_objects("HR", &["a", "b", "c"]);
        let outcome = search_documents(
            &backend,
            &llm(),
            "HR",
            "leave",
            SearchMode::Hybrid { alpha: 0.7 },
            DEFAULT_LIMIT,
        )
        .await
        .unwrap();

        assert_eq!(backend.calls(), vec!["hybrid:HR:leave:0.7:20"]);
        let results = outcome.into_results("leave");
        assert_eq!(results.search_type, SearchType::Hybrid);
        assert_eq!(results.total_count, 3);
        assert_eq!(results.documents[1].file_name, "Search_Result_2");
        assert!(!results.fallback);
    }

    #[tokio::test]
    async fn test_generative_success_yields_single_record() {
        let backend = FakeBackend::with_objects("Finance", &["budget"]);
        backend.state.lock().unwrap().generated = Some("Budgets are set quarterly.".into());

        let outcome = search_documents(
            &backend,
            &llm(),
            "Finance",
            "budget cycle",
            SearchMode::Generative,
            DEFAULT_LIMIT,
        )
        .await
        .unwrap();

        match &outcome {
            SearchOutcome::Generative(record) => {
                assert_eq!(record.content, "Budgets are set quarterly.");
                assert_eq!(record.file_name, normalize::GENERATED_FILE_NAME);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(backend.calls(), vec!["generate:Finance:budget cycle:5"]);
    }

    #[tokio::test]
    async fn test_generative_failure_falls_back_to_hybrid() {
        let backend = FakeBackend::with_objects("HR", &["policy one", "policy two"]);
        backend.state.lock().unwrap().fail_generate = true;

        let outcome = search_documents(
            &backend,
            &llm(),
            "HR",
            "remote work",
            SearchMode::Generative,
            DEFAULT_LIMIT,
        )
        .await
        .unwrap();

        assert!(outcome.is_fallback());
        assert_eq!(
            backend.calls(),
            vec!["generate:HR:remote work:5", "hybrid:HR:remote work:0.5:10"]
        );
        let results = outcome.into_results("remote work");
        assert_eq!(results.search_type, SearchType::Hybrid);
        assert!(results.fallback);
        assert_eq!(results.total_count, 2);
        assert!(results.notice.unwrap().contains("falling back to hybrid"));
    }

    #[tokio::test]
    async fn test_empty_results_carry_notice() {
        let backend = FakeBackend::with_objects("HR", &[]);
        let outcome = search_documents(&backend, &llm(), "HR", "zzz", SearchMode::Keyword, DEFAULT_LIMIT)
            .await
            .unwrap();
        let results = outcome.into_results("zzz");
        assert_eq!(results.total_count, 0);
        assert_eq!(results.notice.as_deref(), Some(NO_RESULTS));
    }

    #[tokio::test]
    async fn test_empty_fallback_keeps_both_notices() {
        let backend = FakeBackend::with_objects("HR", &[]);
        backend.state.lock().unwrap().fail_generate = true;
        let outcome = search_documents(&backend, &llm(), "HR", "zzz", SearchMode::Generative, DEFAULT_LIMIT)
            .await
            .unwrap();

        let results = outcome.into_results("zzz");
        assert!(results.fallback);
        let notice = results.notice.unwrap();
        assert!(notice.starts_with("Generative search failed ("));
        assert!(notice.contains("falling back to hybrid search"));
        assert!(notice.ends_with(NO_RESULTS));
    }

    #[tokio::test]
    async fn test_missing_generated_text_also_falls_back() {
        let backend = FakeBackend::with_objects("HR", &["x"]);
        let outcome = search_documents(
            &backend,
            &llm(),
            "HR",
            "q",
            SearchMode::Generative,
            DEFAULT_LIMIT,
        )
        .await
        .unwrap();

        match outcome {
            SearchOutcome::FallbackHybrid { reason, .. } => {
                assert_eq!(reason, FallbackReason::NoGeneratedText)
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_fallback_surfaces_error_and_releases_session() {
        let backend = FakeBackend::with_objects("HR", &["x"]);
        {
            let mut state = backend.state.lock().unwrap();
            state.fail_generate = true;
            state.fail_hybrid = true;
        }

        let result = search_documents(
            &backend,
            &llm(),
            "HR",
            "q",
            SearchMode::Generative,
            DEFAULT_LIMIT,
        )
        .await;

        assert!(matches!(result, Err(AppError::Upstream(_))));
        assert_eq!(backend.open_sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        let backend = FakeBackend::default();
        backend.state.lock().unwrap().fail_connect = true;

        let result = search_documents(
            &backend,
            &llm(),
            "HR",
            "q",
            SearchMode::Keyword,
            DEFAULT_LIMIT,
        )
        .await;
        assert!(matches!(result, Err(AppError::Connection(_))));
    }
}
