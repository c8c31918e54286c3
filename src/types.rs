// Type definitions and enums

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Search mode label as it travels over the API and is shown in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Keyword,
    Vector,
    Hybrid,
    Generative,
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchType::Keyword => write!(f, "keyword"),
            SearchType::Vector => write!(f, "vector"),
            SearchType::Hybrid => write!(f, "hybrid"),
            SearchType::Generative => write!(f, "generative"),
        }
    }
}

impl std::str::FromStr for SearchType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyword" => Ok(SearchType::Keyword),
            "vector" => Ok(SearchType::Vector),
            "hybrid" => Ok(SearchType::Hybrid),
            "generative" => Ok(SearchType::Generative),
            other => Err(AppError::InvalidRequest(format!("Invalid search type: {}", other))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to connect to Weaviate: {0}")]
    Connection(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Connection(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "Connection error",
            AppError::Upstream(_) => "Search error",
            AppError::InvalidRequest(_) => "Invalid request",
            AppError::NotFound(_) => "Not found",
            AppError::Io(_) => "I/O error",
            AppError::Internal(_) => "Internal error",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidRequest(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(serde_json::json!({
                "error": self.label(),
                "details": self.to_string(),
            })),
        )
            .into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
