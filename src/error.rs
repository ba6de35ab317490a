use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Error response type
#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures the document endpoints can report
///
/// A missing document is not one of them; it is answered with a regular
/// `{"message": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be read
    BodyRead(axum::Error),
    /// The key-value backend failed
    Store(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BodyRead(err) => (
                StatusCode::BAD_REQUEST,
                format!("Failed to read request body: {}", err),
            ),
            ApiError::Store(err) => {
                tracing::error!("Store error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Store error: {:#}", err),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Store(err)
    }
}

impl From<axum::Error> for ApiError {
    fn from(err: axum::Error) -> Self {
        ApiError::BodyRead(err)
    }
}
