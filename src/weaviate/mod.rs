//! Weaviate Module
//!
//! Client side of the managed vector database:
//! - GraphQL `Get` queries for bm25, nearText, hybrid and generative search
//! - Plain `Get` listing and GraphQL `Aggregate` counts per tenant
//! - The hosted Query Agent endpoint for agentic queries
//! - Batch object inserts for loading the markdown tree
//!
//! A [`SearchBackend`] hands out one [`BackendSession`] per logical operation.
//! The session owns its HTTP connection pool and releases it when dropped,
//! so every exit path of an operation (including `?` early returns) closes it.

pub mod agent_api;
pub mod batch;
pub mod client;
pub mod graphql;

pub use client::{WeaviateClient, WeaviateSession};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::types::AppError;

/// Errors returned by the vector database service
#[derive(Debug, Error)]
pub enum WeaviateError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("GraphQL error: {0}")]
    GraphQL(String),

    #[error("failed to parse response: {0}")]
    Parse(String),
}

pub type WeaviateResult<T> = std::result::Result<T, WeaviateError>;

impl From<WeaviateError> for AppError {
    fn from(err: WeaviateError) -> Self {
        match err {
            WeaviateError::Connection(msg) => AppError::Connection(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// One object as returned by a query, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObject {
    pub id: Option<Uuid>,
    pub properties: Map<String, Value>,
    pub score: Option<f64>,
}

impl RawObject {
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }
}

/// Prompts and provider settings for a generative query
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub query: String,
    pub limit: usize,
    pub single_prompt: String,
    pub grouped_task: String,
    pub provider: GenerativeProvider,
}

/// Anthropic settings passed along with the generate clause
#[derive(Debug, Clone, PartialEq)]
pub struct GenerativeProvider {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub objects: Vec<RawObject>,
    /// Grouped generation over all returned objects
    pub generated: Option<String>,
}

/// Source of fresh sessions against the vector database
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn connect(&self) -> WeaviateResult<Box<dyn BackendSession>>;
}

/// Tenant-scoped operations available on one open session
#[async_trait]
pub trait BackendSession: Send + Sync {
    async fn bm25(&self, tenant: &str, query: &str, limit: usize) -> WeaviateResult<Vec<RawObject>>;

    async fn near_text(&self, tenant: &str, query: &str, limit: usize)
        -> WeaviateResult<Vec<RawObject>>;

    async fn hybrid(
        &self,
        tenant: &str,
        query: &str,
        alpha: f64,
        limit: usize,
    ) -> WeaviateResult<Vec<RawObject>>;

    async fn generate(&self, tenant: &str, request: &GenerateRequest)
        -> WeaviateResult<GenerateResponse>;

    async fn fetch_objects(&self, tenant: &str, limit: usize) -> WeaviateResult<Vec<RawObject>>;

    async fn count_objects(&self, tenant: &str) -> WeaviateResult<usize>;

    /// Run the hosted Query Agent; the raw JSON answer bundle is returned as-is
    async fn run_query_agent(&self, tenant: &str, query: &str) -> WeaviateResult<Value>;

    /// Batch-insert objects into a tenant; returns how many were stored
    async fn insert_objects(&self, tenant: &str, objects: Vec<Map<String, Value>>)
        -> WeaviateResult<usize>;
}
