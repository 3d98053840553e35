//! Error types for the HTTP query layer.
//!
//! [`ObserverError`] converts into an Axum response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Server
//! side failures are logged in full and reported to the client with a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Errors that can occur while answering a query.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A response body could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Serialization(e) => {
                error!(error = %e, "Query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("internal server error"),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
