//! Query Agent
//!
//! Runs the hosted Query Agent for one tenant and turns its answer bundle into
//! an [`AgentResponse`]: the structured fields plus the precomputed report
//! strings from [`report`].
//!
//! The agent's JSON is read leniently. A field with an unexpected type is
//! logged and treated as absent so that a partial answer still renders.

pub mod report;

pub use report::{format_report, FormattedReport};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::models::DocumentRecord;
use crate::search::normalize::{self, NamePrefix};
use crate::search::{FALLBACK_ALPHA, FALLBACK_LIMIT};
use crate::types::{AppError, AppResult};
use crate::weaviate::SearchBackend;

/// Token and request counters reported by the agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub requests: Option<u64>,
    pub request_tokens: Option<u64>,
    pub response_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
    pub total_time_sec: Option<f64>,
}

/// One sub-query the agent ran against a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchGroup {
    pub collection: Option<String>,
    pub queries: Vec<String>,
    pub filters: Vec<Value>,
    pub filter_operators: Option<String>,
}

/// One aggregation the agent ran against a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationGroup {
    pub collection: Option<String>,
    pub search_query: Option<String>,
}

/// Structured agent result; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub query: Option<String>,
    pub tenant: Option<String>,
    pub answer: Option<String>,
    #[serde(default)]
    pub source_documents: Vec<DocumentRecord>,
    pub collections: Option<Vec<String>>,
    pub usage: Option<Usage>,
    #[serde(default)]
    pub searches: Vec<SearchGroup>,
    #[serde(default)]
    pub aggregations: Vec<AggregationGroup>,
}

/// Agent result plus its display strings, as sent to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    #[serde(flatten)]
    pub result: AgentResult,
    #[serde(flatten)]
    pub report: FormattedReport,
}

impl AgentResponse {
    pub fn new(result: AgentResult) -> Self {
        let report = format_report(&result);
        Self { result, report }
    }
}

fn string_field(raw: &Value, field: &str) -> Option<String> {
    match raw.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            warn!(field = field, value = %other, "Unexpected type in agent response, ignoring");
            None
        }
    }
}

fn count_field(raw: &Value, field: &str) -> Option<u64> {
    match raw.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => {
            let count = n.as_u64();
            if count.is_none() {
                warn!(field = field, value = %n, "Counter is not a non-negative integer, ignoring");
            }
            count
        }
        Some(other) => {
            warn!(field = field, value = %other, "Unexpected type in agent response, ignoring");
            None
        }
    }
}

fn time_field(raw: &Value, field: &str) -> Option<f64> {
    match raw.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(other) => {
            warn!(field = field, value = %other, "Non-numeric elapsed time in agent response");
            None
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Flatten `[[item, ...], ...]` groups; a flat list is accepted as well
fn flatten_groups(raw: &Value, field: &str) -> Vec<Value> {
    match raw.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(groups)) => groups
            .iter()
            .flat_map(|group| match group {
                Value::Array(items) => items.clone(),
                item => vec![item.clone()],
            })
            .collect(),
        Some(other) => {
            warn!(field = field, value = %other, "Expected a list in agent response, ignoring");
            Vec::new()
        }
    }
}

fn parse_search(item: &Value) -> SearchGroup {
    let queries = match item.get("queries") {
        Some(v) if !v.is_null() => string_list(Some(v)),
        _ => string_list(item.get("query")),
    };
    let filters = match item.get("filters") {
        Some(Value::Array(filters)) => filters.clone(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => vec![other.clone()],
    };
    SearchGroup {
        collection: string_field(item, "collection"),
        queries,
        filters,
        filter_operators: string_field(item, "filter_operators"),
    }
}

fn parse_aggregation(item: &Value) -> AggregationGroup {
    AggregationGroup {
        collection: string_field(item, "collection"),
        search_query: string_field(item, "search_query"),
    }
}

impl AgentResult {
    /// Read the agent's answer bundle, tolerating missing or mistyped fields
    pub fn from_agent_json(
        query: &str,
        tenant: &str,
        raw: &Value,
        source_documents: Vec<DocumentRecord>,
    ) -> Self {
        // Elapsed time lives at the top level, not under `usage`
        let counters = match raw.get("usage") {
            Some(u @ Value::Object(_)) => u.clone(),
            None | Some(Value::Null) => Value::Null,
            Some(other) => {
                warn!(value = %other, "Expected an object for usage, ignoring");
                Value::Null
            }
        };
        let usage = Some(Usage {
            requests: count_field(&counters, "requests"),
            request_tokens: count_field(&counters, "request_tokens"),
            response_tokens: count_field(&counters, "response_tokens"),
            total_tokens: count_field(&counters, "total_tokens"),
            total_time_sec: time_field(raw, "total_time"),
        });

        let collections = match raw.get("collection_names") {
            Some(v @ Value::Array(_)) => Some(string_list(Some(v))),
            _ => None,
        };

        Self {
            query: Some(query.to_string()),
            tenant: Some(tenant.to_string()),
            answer: string_field(raw, "final_answer"),
            source_documents,
            collections,
            usage,
            searches: flatten_groups(raw, "searches").iter().map(parse_search).collect(),
            aggregations: flatten_groups(raw, "aggregations")
                .iter()
                .map(parse_aggregation)
                .collect(),
        }
    }
}

/// Run an agentic query and gather supporting source documents
pub async fn query_agent(
    backend: &dyn SearchBackend,
    tenant: &str,
    query: &str,
) -> AppResult<AgentResponse> {
    let session = backend.connect().await.map_err(|e| {
        error!(tenant = %tenant, query = %query, error = %e, "Failed to connect to Weaviate");
        AppError::from(e)
    })?;

    let raw = session.run_query_agent(tenant, query).await.map_err(|e| {
        error!(tenant = %tenant, query = %query, error = %e, "Query Agent error");
        AppError::from(e)
    })?;

    let source_documents = match session
        .hybrid(tenant, query, FALLBACK_ALPHA, FALLBACK_LIMIT)
        .await
    {
        Ok(objects) => normalize::to_records(&objects, NamePrefix::SourceDocument),
        Err(e) => {
            warn!(tenant = %tenant, query = %query, error = %e, "Could not retrieve source documents");
            Vec::new()
        }
    };

    let result = AgentResult::from_agent_json(query, tenant, &raw, source_documents);
    info!(
        tenant = %tenant,
        query = %query,
        sources = result.source_documents.len(),
        "Query Agent completed"
    );
    Ok(AgentResponse::new(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weaviate::testing::FakeBackend;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn agent_answer() -> Value {
        json!({
            "original_query": "How many vacation days?",
            "collection_names": ["BoxDocuments"],
            "final_answer": "Employees get 20 days.",
            "searches": [[
                { "queries": ["vacation days"], "filters": [], "filter_operators": "AND", "collection": "BoxDocuments" }
            ]],
            "aggregations": [],
            "usage": { "requests": 3, "request_tokens": 1200, "response_tokens": 150, "total_tokens": 1350 },
            "total_time": 4.2
        })
    }

    #[test]
    fn test_parse_full_answer() {
        let result = AgentResult::from_agent_json("How many vacation days?", "HR", &agent_answer(), vec![]);
        assert_eq!(result.answer.as_deref(), Some("Employees get 20 days."));
        assert_eq!(result.collections, Some(vec!["BoxDocuments".to_string()]));
        assert_eq!(result.searches.len(), 1);
        assert_eq!(result.searches[0].queries, vec!["vacation days"]);
        assert_eq!(result.searches[0].filter_operators.as_deref(), Some("AND"));
        let usage = result.usage.unwrap();
        assert_eq!(usage.total_tokens, Some(1350));
        assert_eq!(usage.total_time_sec, Some(4.2));
    }

    #[test]
    fn test_mistyped_fields_degrade_to_absent() {
        let raw = json!({
            "final_answer": 42,
            "searches": "oops",
            "usage": { "requests": "three", "total_tokens": 10 },
            "total_time": "slow"
        });
        let result = AgentResult::from_agent_json("q", "HR", &raw, vec![]);
        assert_eq!(result.answer, None);
        assert!(result.searches.is_empty());
        let usage = result.usage.unwrap();
        assert_eq!(usage.requests, None);
        assert_eq!(usage.total_tokens, Some(10));
        assert_eq!(usage.total_time_sec, None);
    }

    #[test]
    fn test_elapsed_time_kept_without_usage_counters() {
        let raw = json!({ "final_answer": "x", "total_time": 2.0 });
        let result = AgentResult::from_agent_json("q", "HR", &raw, vec![]);
        let usage = result.usage.clone().unwrap();
        assert_eq!(usage.requests, None);
        assert_eq!(usage.total_time_sec, Some(2.0));

        let report = format_report(&result);
        assert!(report.usage_block.ends_with("Total Time Taken: 2.00s"));
    }

    #[test]
    fn test_non_integer_counters_are_dropped() {
        let raw = json!({ "usage": { "requests": 3.0, "request_tokens": 7, "total_tokens": -1 } });
        let usage = AgentResult::from_agent_json("q", "HR", &raw, vec![]).usage.unwrap();
        assert_eq!(usage.requests, None);
        assert_eq!(usage.request_tokens, Some(7));
        assert_eq!(usage.total_tokens, None);
    }

    #[test]
    fn test_single_query_string_is_accepted() {
        let raw = json!({ "searches": [{ "query": "budget", "collection": "Docs" }] });
        let result = AgentResult::from_agent_json("q", "Finance", &raw, vec![]);
        assert_eq!(result.searches[0].queries, vec!["budget"]);
        assert_eq!(result.searches[0].collection.as_deref(), Some("Docs"));
    }

    #[tokio::test]
    async fn test_query_agent_attaches_sources_and_report() {
        let backend = FakeBackend::with_objects("HR", &["Vacation accrues monthly"]);
        backend.state.lock().unwrap().agent_answer = Some(agent_answer());

        let response = query_agent(&backend, "HR", "How many vacation days?")
            .await
            .unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                "agent:HR:How many vacation days?",
                "hybrid:HR:How many vacation days?:0.5:10"
            ]
        );
        assert_eq!(response.result.source_documents.len(), 1);
        assert_eq!(response.result.source_documents[0].file_name, "Source_Document_1");
        assert!(response.report.pretty_text.contains("Employees get 20 days."));
        assert_eq!(response.report.pretty_blocks.len(), 5);
        assert_eq!(backend.open_sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_source_lookup_failure_is_not_fatal() {
        let backend = FakeBackend::with_objects("HR", &["x"]);
        {
            let mut state = backend.state.lock().unwrap();
            state.agent_answer = Some(agent_answer());
            state.fail_hybrid = true;
        }

        let response = query_agent(&backend, "HR", "q").await.unwrap();
        assert!(response.result.source_documents.is_empty());
        assert!(response.report.pretty_text.contains("🔗 Sources"));
    }

    #[tokio::test]
    async fn test_agent_failure_is_an_error() {
        let backend = FakeBackend::with_objects("HR", &["x"]);
        let result = query_agent(&backend, "HR", "q").await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
        assert_eq!(backend.open_sessions.load(Ordering::SeqCst), 0);
    }
}
