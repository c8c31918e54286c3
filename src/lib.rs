// Document Search Console - tenant-scoped search and Query Agent front end for Weaviate

pub mod agent;
pub mod config;
pub mod documents;
pub mod ingest;     // Markdown folder loader
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;     // Keyword, vector, hybrid and generative search
pub mod types;
pub mod view;       // Console view state and actions
pub mod weaviate;   // Weaviate GraphQL and Query Agent client

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
