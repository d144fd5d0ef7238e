//! Relay errors, rendered as the fixed `Proxy Error` JSON response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing X-Target-URL header")]
    MissingTarget { method: String, uri: String },

    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            Self::MissingTarget { method, uri } => {
                error!("[Proxy] Missing X-Target-URL header on {} {}", method, uri)
            }
            other => error!("[Proxy] Error: {}", other),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "Proxy Error",
                "details": self.to_string(),
            })),
        )
            .into_response()
    }
}
