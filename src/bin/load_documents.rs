// Loads data/<tenant>/*.md into the configured collection as 200-word chunks

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doc_search_console::config::Config;
use doc_search_console::ingest::{load_data_dir, CHUNK_WORDS};
use doc_search_console::weaviate::WeaviateClient;

#[derive(Parser, Debug)]
#[command(about = "Chunk tenant markdown folders and insert them into Weaviate")]
struct Args {
    /// Root folder holding one sub-folder per tenant. Defaults to DATA_DIR.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Only load these tenants (repeat or comma-separate).
    #[arg(long, value_delimiter = ',')]
    tenant: Vec<String>,
    /// Words per chunk.
    #[arg(long, default_value_t = CHUNK_WORDS)]
    chunk_words: usize,
    /// Count chunks without inserting anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_search_console=info,load_documents=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    if args.chunk_words == 0 {
        anyhow::bail!("--chunk-words must be at least 1");
    }

    let config = Config::from_env()?;
    let data_dir = args.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let only = (!args.tenant.is_empty()).then_some(args.tenant.as_slice());

    info!(
        data_dir = %data_dir.display(),
        collection = %config.weaviate.collection,
        tenants = ?only,
        chunk_words = args.chunk_words,
        dry_run = args.dry_run,
        "Loading documents"
    );

    let client = WeaviateClient::from_config(&config);
    let report = load_data_dir(&client, &data_dir, only, args.chunk_words, args.dry_run)
        .await
        .map_err(|e| anyhow::anyhow!("Load failed: {}", e))?;

    for tenant in &report.tenants {
        println!(
            "{}: {} files, {} chunks, {} stored",
            tenant.tenant, tenant.files, tenant.chunks, tenant.stored
        );
    }
    println!("Total stored: {}", report.total_stored());

    Ok(())
}
