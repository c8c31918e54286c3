//! GraphQL query construction and response parsing
//!
//! Queries are built as plain strings; user text is always embedded through
//! JSON string encoding, which is a valid GraphQL string literal.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{GenerateRequest, GenerateResponse, RawObject, WeaviateError, WeaviateResult};

/// Properties requested for every hit
pub const DEFAULT_PROPERTIES: &[&str] = &["content"];

/// Search operator placed in the `Get` arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator<'a> {
    Bm25 { query: &'a str },
    NearText { query: &'a str },
    Hybrid { query: &'a str, alpha: f64 },
}

fn literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn tenant_arg(tenant: &str) -> String {
    format!("tenant: {}", literal(tenant))
}

fn operator_arg(op: &Operator<'_>) -> String {
    match op {
        Operator::Bm25 { query } => format!("bm25: {{query: {}}}", literal(query)),
        Operator::NearText { query } => format!("nearText: {{concepts: [{}]}}", literal(query)),
        Operator::Hybrid { query, alpha } => {
            format!("hybrid: {{query: {}, alpha: {}}}", literal(query), alpha)
        }
    }
}

fn additional_fields(op: &Operator<'_>) -> &'static str {
    match op {
        Operator::NearText { .. } => "_additional { id distance }",
        _ => "_additional { id score }",
    }
}

/// `Get` query for one of the plain search operators
pub fn get_query(collection: &str, tenant: &str, op: &Operator<'_>, limit: usize) -> String {
    format!(
        "{{ Get {{ {}({}, {}, limit: {}) {{ {} {} }} }} }}",
        collection,
        tenant_arg(tenant),
        operator_arg(op),
        limit,
        DEFAULT_PROPERTIES.join(" "),
        additional_fields(op),
    )
}

/// `Get` query without a search operator, used for browsing
pub fn list_query(collection: &str, tenant: &str, limit: usize) -> String {
    format!(
        "{{ Get {{ {}({}, limit: {}) {{ {} _additional {{ id }} }} }} }}",
        collection,
        tenant_arg(tenant),
        limit,
        DEFAULT_PROPERTIES.join(" "),
    )
}

/// nearText query with a generate clause for single and grouped results
pub fn generate_query(collection: &str, tenant: &str, request: &GenerateRequest) -> String {
    let provider = format!(
        "generativeAnthropic: {{model: {}, maxTokens: {}, temperature: {}}}",
        literal(&request.provider.model),
        request.provider.max_tokens,
        request.provider.temperature,
    );
    format!(
        "{{ Get {{ {}({}, {}, limit: {}) {{ {} _additional {{ id generate(singleResult: {{prompt: {}, {}}} groupedResult: {{task: {}, {}}}) {{ singleResult groupedResult error }} }} }} }} }}",
        collection,
        tenant_arg(tenant),
        operator_arg(&Operator::NearText { query: &request.query }),
        request.limit,
        DEFAULT_PROPERTIES.join(" "),
        literal(&request.single_prompt),
        provider,
        literal(&request.grouped_task),
        provider,
    )
}

pub fn count_query(collection: &str, tenant: &str) -> String {
    format!(
        "{{ Aggregate {{ {}({}) {{ meta {{ count }} }} }} }}",
        collection,
        tenant_arg(tenant),
    )
}

/// Wrap a query into the JSON body expected by `/v1/graphql`
pub fn request_body(query: String) -> Value {
    serde_json::json!({ "query": query })
}

fn check_errors(response: &Value) -> WeaviateResult<()> {
    let Some(errors) = response.get("errors").and_then(Value::as_array) else {
        return Ok(());
    };
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<&str> = errors
        .iter()
        .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
        .collect();
    Err(WeaviateError::GraphQL(messages.join("; ")))
}

fn section<'a>(response: &'a Value, root: &str, collection: &str) -> WeaviateResult<&'a Value> {
    check_errors(response)?;
    response
        .get("data")
        .and_then(|d| d.get(root))
        .and_then(|g| g.get(collection))
        .ok_or_else(|| WeaviateError::Parse(format!("missing data.{}.{}", root, collection)))
}

fn parse_score(additional: Option<&Value>) -> Option<f64> {
    match additional?.get("score")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_object(item: &Value) -> RawObject {
    let additional = item.get("_additional");
    let id = additional
        .and_then(|a| a.get("id"))
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok());

    let properties: Map<String, Value> = item
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(k, _)| k.as_str() != "_additional")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();

    RawObject {
        id,
        properties,
        score: parse_score(additional),
    }
}

pub fn parse_get(response: &Value, collection: &str) -> WeaviateResult<Vec<RawObject>> {
    let items = section(response, "Get", collection)?;
    match items {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().map(parse_object).collect()),
        _ => Err(WeaviateError::Parse("expected an array of objects".to_string())),
    }
}

pub fn parse_generate(response: &Value, collection: &str) -> WeaviateResult<GenerateResponse> {
    let objects = parse_get(response, collection)?;
    let items = section(response, "Get", collection)?
        .as_array()
        .cloned()
        .unwrap_or_default();

    let mut generated = None;
    for item in &items {
        let Some(generate) = item.get("_additional").and_then(|a| a.get("generate")) else {
            continue;
        };
        if let Some(error) = generate.get("error").and_then(Value::as_str) {
            if !error.is_empty() {
                return Err(WeaviateError::GraphQL(error.to_string()));
            }
        }
        if let Some(text) = generate.get("groupedResult").and_then(Value::as_str) {
            if !text.trim().is_empty() {
                generated = Some(text.to_string());
                break;
            }
        }
    }

    Ok(GenerateResponse { objects, generated })
}

pub fn parse_count(response: &Value, collection: &str) -> WeaviateResult<usize> {
    section(response, "Aggregate", collection)?
        .as_array()
        .and_then(|a| a.first())
        .and_then(|g| g.get("meta"))
        .and_then(|m| m.get("count"))
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .ok_or_else(|| WeaviateError::Parse("missing meta.count".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weaviate::GenerativeProvider;
    use serde_json::json;

    #[test]
    fn test_query_text_is_escaped() {
        let q = get_query("Docs", "HR", &Operator::Bm25 { query: "say \"hi\"\n" }, 20);
        assert!(q.contains(r#"bm25: {query: "say \"hi\"\n"}"#));
        assert!(q.contains(r#"tenant: "HR""#));
        assert!(q.contains("limit: 20"));
    }

    #[test]
    fn test_hybrid_carries_alpha() {
        let q = get_query("Docs", "HR", &Operator::Hybrid { query: "pto", alpha: 0.3 }, 10);
        assert!(q.contains(r#"hybrid: {query: "pto", alpha: 0.3}"#));
        assert!(q.contains("_additional { id score }"));
    }

    #[test]
    fn test_generate_query_embeds_prompts_and_provider() {
        let request = GenerateRequest {
            query: "refund policy".into(),
            limit: 5,
            single_prompt: "Answer: refund policy".into(),
            grouped_task: "Summarize".into(),
            provider: GenerativeProvider {
                model: "claude".into(),
                max_tokens: 256,
                temperature: 0.7,
            },
        };
        let q = generate_query("Docs", "Finance", &request);
        assert!(q.contains(r#"nearText: {concepts: ["refund policy"]}"#));
        assert!(q.contains(r#"singleResult: {prompt: "Answer: refund policy""#));
        assert!(q.contains(r#"groupedResult: {task: "Summarize""#));
        assert!(q.contains("maxTokens: 256"));
    }

    #[test]
    fn test_parse_get_reads_string_scores() {
        let id = Uuid::new_v4();
        let response = json!({
            "data": { "Get": { "Docs": [
                { "content": "alpha", "_additional": { "id": id.to_string(), "score": "0.75" } },
                { "content": "beta", "_additional": { "id": "not-a-uuid", "score": 0.5 } }
            ]}}
        });
        let objects = parse_get(&response, "Docs").unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].id, Some(id));
        assert_eq!(objects[0].score, Some(0.75));
        assert_eq!(objects[0].property_str("content"), Some("alpha"));
        assert!(!objects[0].properties.contains_key("_additional"));
        assert_eq!(objects[1].id, None);
        assert_eq!(objects[1].score, Some(0.5));
    }

    #[test]
    fn test_parse_get_surfaces_graphql_errors() {
        let response = json!({
            "data": { "Get": { "Docs": null } },
            "errors": [{ "message": "tenant not found" }, { "message": "second" }]
        });
        match parse_get(&response, "Docs") {
            Err(WeaviateError::GraphQL(msg)) => assert_eq!(msg, "tenant not found; second"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_generate_picks_grouped_result() {
        let response = json!({
            "data": { "Get": { "Docs": [
                { "content": "a", "_additional": { "id": null, "generate": { "singleResult": "x", "groupedResult": "Summary", "error": null } } },
                { "content": "b", "_additional": { "id": null, "generate": { "singleResult": "y", "groupedResult": null, "error": null } } }
            ]}}
        });
        let generated = parse_generate(&response, "Docs").unwrap();
        assert_eq!(generated.generated.as_deref(), Some("Summary"));
        assert_eq!(generated.objects.len(), 2);
    }

    #[test]
    fn test_parse_generate_reports_generation_error() {
        let response = json!({
            "data": { "Get": { "Docs": [
                { "content": "a", "_additional": { "generate": { "groupedResult": null, "error": "rate limited" } } }
            ]}}
        });
        assert!(matches!(
            parse_generate(&response, "Docs"),
            Err(WeaviateError::GraphQL(_))
        ));
    }

    #[test]
    fn test_parse_count() {
        let response = json!({ "data": { "Aggregate": { "Docs": [ { "meta": { "count": 42 } } ] } } });
        assert_eq!(parse_count(&response, "Docs").unwrap(), 42);
        assert!(parse_count(&json!({ "data": {} }), "Docs").is_err());
    }
}
