pub mod config;
pub mod routes;
pub mod server;

pub use config::ApiConfig;
pub use routes::ApiContext;
pub use server::ApiServer;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use indexer_core::IndexerError;
use indexer_notifier::NotifierError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server error: {0}")]
    Server(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<IndexerError> for ApiError {
    fn from(err: IndexerError) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl From<NotifierError> for ApiError {
    fn from(err: NotifierError) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Server(_) | ApiError::Store(_) => {
                error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
