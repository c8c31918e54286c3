//! Markdown Loader
//!
//! Loads `<data_dir>/<tenant>/*.md` into the collection. Each file is split
//! into fixed-size word chunks and every chunk becomes one object with a
//! `content` property in the tenant named after its folder.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::types::{AppError, AppResult};
use crate::weaviate::SearchBackend;

/// Words per stored chunk
pub const CHUNK_WORDS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TenantLoad {
    pub tenant: String,
    pub files: usize,
    pub chunks: usize,
    pub stored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub tenants: Vec<TenantLoad>,
}

impl LoadReport {
    pub fn total_stored(&self) -> usize {
        self.tenants.iter().map(|t| t.stored).sum()
    }
}

/// Split on whitespace and re-join every `size` words
pub fn chunk_words(text: &str, size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(size.max(1)).map(|chunk| chunk.join(" ")).collect()
}

async fn sorted_entries(dir: &Path, want_dirs: bool) -> AppResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let is_dir = entry.file_type().await?.is_dir();
        let path = entry.path();
        if want_dirs && is_dir {
            paths.push(path);
        } else if !want_dirs && !is_dir && path.extension().and_then(|e| e.to_str()) == Some("md") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every tenant folder under `data_dir`
///
/// With `only` set, folders not in the list are skipped. With `dry_run` the
/// chunks are counted but nothing is sent.
pub async fn load_data_dir(
    backend: &dyn SearchBackend,
    data_dir: &Path,
    only: Option<&[String]>,
    chunk_size: usize,
    dry_run: bool,
) -> AppResult<LoadReport> {
    if !tokio::fs::try_exists(data_dir).await.unwrap_or(false) {
        return Err(AppError::NotFound(format!(
            "data directory {} does not exist",
            data_dir.display()
        )));
    }

    let mut report = LoadReport::default();
    for folder in sorted_entries(data_dir, true).await? {
        let Some(tenant) = folder.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if let Some(only) = only {
            if !only.iter().any(|t| *t == tenant) {
                info!(tenant = %tenant, "Skipping folder outside tenant list");
                continue;
            }
        }

        let load = load_tenant(backend, &folder, &tenant, chunk_size, dry_run).await?;
        info!(
            tenant = %tenant,
            files = load.files,
            chunks = load.chunks,
            stored = load.stored,
            "Tenant folder loaded"
        );
        report.tenants.push(load);
    }

    Ok(report)
}

async fn load_tenant(
    backend: &dyn SearchBackend,
    folder: &Path,
    tenant: &str,
    chunk_size: usize,
    dry_run: bool,
) -> AppResult<TenantLoad> {
    let mut load = TenantLoad {
        tenant: tenant.to_string(),
        ..TenantLoad::default()
    };

    let session = if dry_run {
        None
    } else {
        Some(backend.connect().await.map_err(|e| {
            error!(tenant = %tenant, error = %e, "Failed to connect to Weaviate");
            AppError::from(e)
        })?)
    };

    for path in sorted_entries(folder, false).await? {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read file");
                continue;
            }
        };
        load.files += 1;

        let chunks = chunk_words(&content, chunk_size);
        load.chunks += chunks.len();
        if chunks.is_empty() {
            continue;
        }

        if let Some(session) = &session {
            let objects: Vec<Map<String, Value>> = chunks
                .into_iter()
                .map(|chunk| {
                    let mut properties = Map::new();
                    properties.insert("content".to_string(), Value::String(chunk));
                    properties
                })
                .collect();
            load.stored += session.insert_objects(tenant, objects).await.map_err(|e| {
                error!(tenant = %tenant, path = %path.display(), error = %e, "Batch insert failed");
                AppError::from(e)
            })?;
        }
    }

    Ok(load)
}
