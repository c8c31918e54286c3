//! Tenant listing and document browsing
//!
//! Chunk listings come from the vector store and are cached per tenant for a
//! short time. Full documents are read straight from `<data_dir>/<tenant>/`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::WeaviateConfig;
use crate::models::{DocumentRecord, FullDocument, TenantInfo};
use crate::search::normalize::{self, NamePrefix};
use crate::types::{AppError, AppResult};
use crate::weaviate::SearchBackend;

/// Number of chunks listed when browsing a tenant
pub const BROWSE_LIMIT: usize = 50;

const MARKDOWN_EXTENSION: &str = "md";
const MARKDOWN_FILE_TYPE: &str = "markdown";

/// Per-tenant cache of browse listings
#[derive(Clone)]
pub struct DocumentCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, (Instant, Vec<DocumentRecord>)>>>,
}

impl DocumentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, tenant: &str) -> Option<Vec<DocumentRecord>> {
        let entries = self.entries.read().await;
        entries
            .get(tenant)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, docs)| docs.clone())
    }

    pub async fn insert(&self, tenant: &str, documents: Vec<DocumentRecord>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.write().await;
        entries.insert(tenant.to_string(), (Instant::now(), documents));
    }
}

/// Reject tenants that are not configured before anything is sent upstream
pub fn require_known_tenant(config: &WeaviateConfig, tenant: &str) -> AppResult<()> {
    if config.is_known_tenant(tenant) {
        Ok(())
    } else {
        warn!(tenant = %tenant, "Rejected unknown tenant");
        Err(AppError::NotFound(format!("Unknown tenant: {}", tenant)))
    }
}

/// Count the objects of every configured tenant
///
/// A tenant whose count cannot be read is still listed, with zero documents.
pub async fn fetch_tenants(backend: &dyn SearchBackend, tenants: &[String]) -> AppResult<Vec<TenantInfo>> {
    let session = backend.connect().await.map_err(|e| {
        error!(error = %e, "Failed to connect to Weaviate while listing tenants");
        AppError::from(e)
    })?;

    let mut infos = Vec::with_capacity(tenants.len());
    for tenant in tenants {
        let document_count = match session.count_objects(tenant).await {
            Ok(count) => {
                info!(tenant = %tenant, count = count, "Counted tenant documents");
                count
            }
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "Error counting documents for tenant");
                0
            }
        };
        infos.push(TenantInfo {
            name: tenant.clone(),
            document_count,
        });
    }

    Ok(infos)
}

/// First [`BROWSE_LIMIT`] chunks of a tenant, served from cache when fresh
pub async fn fetch_documents(
    backend: &dyn SearchBackend,
    cache: &DocumentCache,
    tenant: &str,
) -> AppResult<Vec<DocumentRecord>> {
    if let Some(documents) = cache.get(tenant).await {
        debug!(tenant = %tenant, count = documents.len(), "Document listing served from cache");
        return Ok(documents);
    }

    let session = backend.connect().await.map_err(|e| {
        error!(tenant = %tenant, error = %e, "Failed to connect to Weaviate");
        AppError::from(e)
    })?;
    let objects = session.fetch_objects(tenant, BROWSE_LIMIT).await.map_err(|e| {
        error!(tenant = %tenant, error = %e, "Error fetching documents");
        AppError::from(e)
    })?;
    drop(session);

    let documents = normalize::to_records(&objects, NamePrefix::Document);
    info!(tenant = %tenant, count = documents.len(), "Retrieved documents");
    cache.insert(tenant, documents.clone()).await;
    Ok(documents)
}

/// Markdown files under `<data_dir>/<tenant>/`, sorted by file name
///
/// Only tenants in `known_tenants` map to a directory; anything else yields an
/// empty list so a tenant name can never be used to walk the filesystem.
pub async fn read_full_documents(
    data_dir: &Path,
    tenant: &str,
    known_tenants: &[String],
) -> AppResult<Vec<FullDocument>> {
    if !known_tenants.iter().any(|t| t == tenant) {
        debug!(tenant = %tenant, "Unknown tenant, no full documents");
        return Ok(Vec::new());
    }

    let dir = data_dir.join(tenant);
    if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
        debug!(path = %dir.display(), "Tenant data directory missing");
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(&dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => documents.push(FullDocument {
                file_name,
                content,
                file_path: path.display().to_string(),
                file_type: MARKDOWN_FILE_TYPE.to_string(),
            }),
            Err(e) => {
                warn!(file = %file_name, error = %e, "Could not read file");
            }
        }
    }

    info!(tenant = %tenant, count = documents.len(), "Read full documents");
    Ok(documents)
}

static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("html tag regex is valid"));

/// Remove HTML tags from document text before it is shown expanded
pub fn strip_html(text: &str) -> String {
    HTML_TAG_RE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weaviate::testing::FakeBackend;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn tenants() -> Vec<String> {
        vec!["HR".to_string(), "Finance".to_string()]
    }

    #[tokio::test]
    async fn test_fetch_tenants_degrades_failed_counts_to_zero() {
        let backend = FakeBackend::with_objects("HR", &["a", "b", "c"]);
        let infos = fetch_tenants(&backend, &tenants()).await.unwrap();

        assert_eq!(
            infos,
            vec![
                TenantInfo { name: "HR".into(), document_count: 3 },
                TenantInfo { name: "Finance".into(), document_count: 0 },
            ]
        );
        assert_eq!(backend.open_sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_tenants_connection_failure() {
        let backend = FakeBackend::default();
        backend.state.lock().unwrap().fail_connect = true;
        let result = fetch_tenants(&backend, &tenants()).await;
        assert!(matches!(result, Err(AppError::Connection(_))));
    }

    #[tokio::test]
    async fn test_fetch_documents_names_and_caches() {
        let backend = FakeBackend::with_objects("HR", &["Leave policy", "Benefits"]);
        let cache = DocumentCache::new(Duration::from_secs(60));

        let first = fetch_documents(&backend, &cache, "HR").await.unwrap();
        assert_eq!(first[0].file_name, "Document_1");
        assert_eq!(first[1].file_name, "Document_2");
        assert_eq!(first[1].chunk_index, 1);

        let second = fetch_documents(&backend, &cache, "HR").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls(), vec!["fetch:HR:50"]);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let backend = FakeBackend::with_objects("HR", &["x"]);
        let cache = DocumentCache::new(Duration::ZERO);
        fetch_documents(&backend, &cache, "HR").await.unwrap();
        fetch_documents(&backend, &cache, "HR").await.unwrap();
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_read_full_documents_sorted_markdown_only() {
        let dir = TempDir::new().unwrap();
        let hr = dir.path().join("HR");
        std::fs::create_dir(&hr).unwrap();
        std::fs::write(hr.join("b_policy.md"), "# Policy B").unwrap();
        std::fs::write(hr.join("a_handbook.md"), "# Handbook").unwrap();
        std::fs::write(hr.join("notes.txt"), "ignored").unwrap();

        let docs = read_full_documents(dir.path(), "HR", &tenants()).await.unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a_handbook.md", "b_policy.md"]);
        assert_eq!(docs[0].content, "# Handbook");
        assert_eq!(docs[0].file_type, "markdown");
        assert!(docs[0].file_path.ends_with("a_handbook.md"));
    }

    #[tokio::test]
    async fn test_unknown_tenant_reads_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Legal")).unwrap();
        std::fs::write(dir.path().join("Legal").join("x.md"), "secret").unwrap();

        let docs = read_full_documents(dir.path(), "Legal", &tenants()).await.unwrap();
        assert!(docs.is_empty());

        let docs = read_full_documents(dir.path(), "../HR", &tenants()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_missing_tenant_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let docs = read_full_documents(dir.path(), "Finance", &tenants()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Travel <b>must</b> be approved</p><br/>"),
            "Travel must be approved"
        );
        assert_eq!(strip_html("x < y"), "x < y");
    }
}
