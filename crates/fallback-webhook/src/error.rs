use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures outside the fallback decision itself. All of them surface to
/// Dialogflow as a bare 500.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("no handler for requested intent: {intent:?}")]
    NoHandler { intent: Option<String> },
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        error!(error = %self, "Error handling webhook request");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}
