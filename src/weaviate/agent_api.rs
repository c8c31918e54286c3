// Wire types for the hosted Query Agent endpoint

use serde::Serialize;
use std::collections::BTreeMap;

/// Header the agent service uses to locate the cluster it should query
pub const CLUSTER_URL_HEADER: &str = "X-Weaviate-Cluster-Url";

#[derive(Debug, Serialize)]
pub struct QueryAgentRequest<'a> {
    pub query: &'a str,
    pub collections: Vec<AgentCollection<'a>>,
    /// Inference provider keys forwarded to the agent's own LLM calls
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct AgentCollection<'a> {
    pub name: &'a str,
    pub tenant: &'a str,
    pub view_properties: Vec<&'a str>,
}

impl<'a> QueryAgentRequest<'a> {
    pub fn new(
        query: &'a str,
        collection: &'a str,
        tenant: &'a str,
        headers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            query,
            collections: vec![AgentCollection {
                name: collection,
                tenant,
                view_properties: vec!["content"],
            }],
            headers,
        }
    }
}

pub fn endpoint(agents_url: &str) -> String {
    format!("{}/query", agents_url.trim_end_matches('/'))
}
