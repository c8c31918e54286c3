//! Static File Serving
//!
//! Serves logos, stylesheets and any other console assets from the configured
//! static directory. The console page itself is embedded (see `ui`).

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Create router for serving static files
pub fn router(static_dir: &Path) -> Router {
    if static_dir.is_dir() {
        info!(path = %static_dir.display(), "Found static files directory");
    } else {
        warn!(path = %static_dir.display(), "Static files directory not found, assets will 404");
    }

    Router::new()
        .nest_service("/assets", ServeDir::new(static_dir.join("assets")))
        .fallback_service(ServeDir::new(static_dir))
}
