//! Weaviate Client
//!
//! Opens short-lived sessions against a Weaviate Cloud cluster.
//!
//! ## Connection lifetime
//!
//! [`WeaviateClient`] only holds settings. Each call to
//! [`SearchBackend::connect`] builds a fresh HTTP client, checks that the
//! cluster is ready, and returns a [`WeaviateSession`]. The session closes its
//! connections when dropped, which happens on every exit path of the caller.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::agent_api::{self, QueryAgentRequest, CLUSTER_URL_HEADER};
use super::batch::{self, BATCH_PATH};
use super::graphql::{self, Operator};
use super::{
    BackendSession, GenerateRequest, GenerateResponse, RawObject, SearchBackend, WeaviateError,
    WeaviateResult,
};
use crate::config::Config;

const READY_PATH: &str = "/v1/.well-known/ready";
const GRAPHQL_PATH: &str = "/v1/graphql";

/// Settings needed to open sessions against one cluster
#[derive(Debug, Clone)]
pub struct WeaviateClient {
    base_url: String,
    api_key: String,
    collection: String,
    agents_url: String,
    timeout: Duration,
    inference_headers: BTreeMap<String, String>,
}

impl WeaviateClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            collection: "BoxDocuments".to_string(),
            agents_url: "https://api.agents.weaviate.io/v1".to_string(),
            timeout: Duration::from_secs(60),
            inference_headers: BTreeMap::new(),
        }
    }

    /// Configure client from config
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.weaviate.url, &config.weaviate.api_key)
            .with_collection(&config.weaviate.collection)
            .with_agents_url(&config.weaviate.agents_url)
            .with_timeout(Duration::from_secs(config.weaviate.request_timeout_secs))
            .with_inference_keys(&config.llm.openai_api_key, &config.llm.anthropic_api_key)
    }

    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    pub fn with_agents_url(mut self, agents_url: &str) -> Self {
        self.agents_url = agents_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Forward inference provider keys; OpenAI wins the generic provider header
    pub fn with_inference_keys(mut self, openai_key: &str, anthropic_key: &str) -> Self {
        self.inference_headers = inference_headers(openai_key, anthropic_key);
        self
    }

    fn default_headers(&self) -> WeaviateResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if !self.api_key.is_empty() {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", self.api_key))?);
        }
        for (name, value) in &self.inference_headers {
            insert_header(&mut headers, name, value)?;
        }
        Ok(headers)
    }
}

fn header_value(value: &str) -> WeaviateResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| WeaviateError::Connection(format!("invalid header value: {}", e)))
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> WeaviateResult<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| WeaviateError::Connection(format!("invalid header name: {}", e)))?;
    headers.insert(name, header_value(value)?);
    Ok(())
}

fn inference_headers(openai_key: &str, anthropic_key: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    if !openai_key.is_empty() {
        headers.insert("X-INFERENCE-PROVIDER-API-KEY".to_string(), openai_key.to_string());
        headers.insert("X-OpenAI-Api-Key".to_string(), openai_key.to_string());
    } else if !anthropic_key.is_empty() {
        headers.insert("X-INFERENCE-PROVIDER-API-KEY".to_string(), anthropic_key.to_string());
    }
    if !anthropic_key.is_empty() {
        headers.insert("X-Anthropic-Api-Key".to_string(), anthropic_key.to_string());
    }
    headers
}

#[async_trait]
impl SearchBackend for WeaviateClient {
    async fn connect(&self) -> WeaviateResult<Box<dyn BackendSession>> {
        Ok(Box::new(WeaviateSession::open(self).await?))
    }
}

/// One open connection to the cluster
pub struct WeaviateSession {
    http: Client,
    base_url: String,
    api_key: String,
    collection: String,
    agents_url: String,
    inference_headers: BTreeMap<String, String>,
    opened_at: Instant,
}

impl WeaviateSession {
    pub async fn open(client: &WeaviateClient) -> WeaviateResult<Self> {
        let http = Client::builder()
            .default_headers(client.default_headers()?)
            .connect_timeout(Duration::from_secs(10))
            .timeout(client.timeout)
            .build()
            .map_err(|e| WeaviateError::Connection(e.to_string()))?;

        let ready_url = format!("{}{}", client.base_url, READY_PATH);
        let response = http
            .get(&ready_url)
            .send()
            .await
            .map_err(|e| WeaviateError::Connection(e.to_string()))?;
        if !response.status().is_success() {
            return Err(WeaviateError::Connection(format!(
                "cluster not ready (status {})",
                response.status().as_u16()
            )));
        }

        debug!(url = %client.base_url, "Opened Weaviate session");
        Ok(Self {
            http,
            base_url: client.base_url.clone(),
            api_key: client.api_key.clone(),
            collection: client.collection.clone(),
            agents_url: client.agents_url.clone(),
            inference_headers: client.inference_headers.clone(),
            opened_at: Instant::now(),
        })
    }

    async fn post_json(&self, url: &str, body: &Value, extra: HeaderMap) -> WeaviateResult<Value> {
        let response = self
            .http
            .post(url)
            .headers(extra)
            .json(body)
            .send()
            .await
            .map_err(|e| WeaviateError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeaviateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| WeaviateError::Parse(e.to_string()))
    }

    async fn graphql(&self, query: String) -> WeaviateResult<Value> {
        debug!(query = %query, "Sending GraphQL query");
        let url = format!("{}{}", self.base_url, GRAPHQL_PATH);
        self.post_json(&url, &graphql::request_body(query), HeaderMap::new())
            .await
    }

    async fn get(&self, tenant: &str, op: Operator<'_>, limit: usize) -> WeaviateResult<Vec<RawObject>> {
        let response = self
            .graphql(graphql::get_query(&self.collection, tenant, &op, limit))
            .await?;
        graphql::parse_get(&response, &self.collection)
    }
}

impl Drop for WeaviateSession {
    fn drop(&mut self) {
        debug!(
            elapsed_ms = self.opened_at.elapsed().as_millis() as u64,
            "Closed Weaviate session"
        );
    }
}

#[async_trait]
impl BackendSession for WeaviateSession {
    async fn bm25(&self, tenant: &str, query: &str, limit: usize) -> WeaviateResult<Vec<RawObject>> {
        self.get(tenant, Operator::Bm25 { query }, limit).await
    }

    async fn near_text(
        &self,
        tenant: &str,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<RawObject>> {
        self.get(tenant, Operator::NearText { query }, limit).await
    }

    async fn hybrid(
        &self,
        tenant: &str,
        query: &str,
        alpha: f64,
        limit: usize,
    ) -> WeaviateResult<Vec<RawObject>> {
        self.get(tenant, Operator::Hybrid { query, alpha }, limit).await
    }

    async fn generate(
        &self,
        tenant: &str,
        request: &GenerateRequest,
    ) -> WeaviateResult<GenerateResponse> {
        let response = self
            .graphql(graphql::generate_query(&self.collection, tenant, request))
            .await?;
        graphql::parse_generate(&response, &self.collection)
    }

    async fn fetch_objects(&self, tenant: &str, limit: usize) -> WeaviateResult<Vec<RawObject>> {
        let response = self
            .graphql(graphql::list_query(&self.collection, tenant, limit))
            .await?;
        graphql::parse_get(&response, &self.collection)
    }

    async fn count_objects(&self, tenant: &str) -> WeaviateResult<usize> {
        let response = self
            .graphql(graphql::count_query(&self.collection, tenant))
            .await?;
        graphql::parse_count(&response, &self.collection)
    }

    async fn run_query_agent(&self, tenant: &str, query: &str) -> WeaviateResult<Value> {
        info!(tenant = %tenant, query = %query, "Running Query Agent");

        let request = QueryAgentRequest::new(
            query,
            &self.collection,
            tenant,
            self.inference_headers.clone(),
        );
        let body = serde_json::to_value(&request).map_err(|e| WeaviateError::Parse(e.to_string()))?;

        let mut extra = HeaderMap::new();
        insert_header(&mut extra, CLUSTER_URL_HEADER, &self.base_url)?;
        if !self.api_key.is_empty() {
            extra.insert(AUTHORIZATION, header_value(&format!("Bearer {}", self.api_key))?);
        }

        self.post_json(&agent_api::endpoint(&self.agents_url), &body, extra)
            .await
    }

    async fn insert_objects(
        &self,
        tenant: &str,
        objects: Vec<Map<String, Value>>,
    ) -> WeaviateResult<usize> {
        let submitted = objects.len();
        let url = format!("{}{}", self.base_url, BATCH_PATH);
        let body = batch::batch_body(&self.collection, tenant, objects);
        let response = self.post_json(&url, &body, HeaderMap::new()).await?;
        let outcome = batch::parse_batch(&response)?;

        for error in &outcome.errors {
            warn!(tenant = %tenant, error = %error, "Object rejected by batch insert");
        }
        if outcome.stored == 0 && submitted > 0 {
            return Err(WeaviateError::Request(format!(
                "batch insert stored none of {} objects",
                submitted
            )));
        }
        debug!(tenant = %tenant, stored = outcome.stored, submitted = submitted, "Batch insert finished");
        Ok(outcome.stored)
    }
}
