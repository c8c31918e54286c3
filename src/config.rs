use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_TENANTS: &str = "HR,Finance,Customer-Service";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub weaviate: WeaviateConfig,
    pub llm: LLMConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeaviateConfig {
    /// Cluster URL; a bare host gets an `https://` prefix
    pub url: String,
    pub api_key: String,
    /// Multi-tenant collection holding the chunks
    pub collection: String,
    pub tenants: Vec<String>,
    /// Base URL of the hosted Query Agent service
    pub agents_url: String,
    pub request_timeout_secs: u64,
}

impl WeaviateConfig {
    pub fn is_known_tenant(&self, tenant: &str) -> bool {
        self.tenants.iter().any(|t| t == tenant)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub generative_model: String,
    pub generative_max_tokens: u32,
    pub generative_temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Root of the per-tenant markdown tree (`<data_dir>/<tenant>/*.md`)
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub document_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: split_list(
                    &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
                ),
            },
            weaviate: WeaviateConfig {
                url: normalize_url(
                    &env::var("WCD_URL")
                        .map_err(|_| anyhow::anyhow!("WCD_URL must be set"))?,
                ),
                api_key: env::var("WCD_API_KEY")
                    .map_err(|_| anyhow::anyhow!("WCD_API_KEY must be set"))?,
                collection: env::var("WEAVIATE_COLLECTION")
                    .unwrap_or_else(|_| "BoxDocuments".to_string()),
                tenants: split_list(
                    &env::var("TENANTS").unwrap_or_else(|_| DEFAULT_TENANTS.to_string()),
                ),
                agents_url: env::var("AGENTS_URL")
                    .unwrap_or_else(|_| "https://api.agents.weaviate.io/v1".to_string()),
                request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
            },
            llm: LLMConfig {
                openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                anthropic_api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
                generative_model: env::var("GENERATIVE_MODEL")
                    .unwrap_or_else(|_| "claude-3-opus-20240229".to_string()),
                generative_max_tokens: env::var("GENERATIVE_MAX_TOKENS")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()?,
                generative_temperature: env::var("GENERATIVE_TEMPERATURE")
                    .unwrap_or_else(|_| "0.7".to_string())
                    .parse()?,
            },
            data: DataConfig {
                data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string())),
                static_dir: PathBuf::from(
                    env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
                ),
                document_cache_ttl_secs: env::var("DOCUMENT_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            weaviate: WeaviateConfig {
                url: "http://localhost:8080".to_string(),
                api_key: String::new(),
                collection: "BoxDocuments".to_string(),
                tenants: split_list(DEFAULT_TENANTS),
                agents_url: "https://api.agents.weaviate.io/v1".to_string(),
                request_timeout_secs: 60,
            },
            llm: LLMConfig {
                openai_api_key: String::new(),
                anthropic_api_key: String::new(),
                generative_model: "claude-3-opus-20240229".to_string(),
                generative_max_tokens: 256,
                generative_temperature: 0.7,
            },
            data: DataConfig {
                data_dir: PathBuf::from("data"),
                static_dir: PathBuf::from("static"),
                document_cache_ttl_secs: 300,
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" HR, Finance ,,Customer-Service "),
            vec!["HR", "Finance", "Customer-Service"]
        );
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("abc.weaviate.cloud"), "https://abc.weaviate.cloud");
        assert_eq!(normalize_url("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(normalize_url("https://x.y"), "https://x.y");
    }
}
