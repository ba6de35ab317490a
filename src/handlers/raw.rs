use crate::error::ApiError;
use crate::models::MessageResponse;
use crate::state::AppState;
use axum::{
    Json,
    http::header,
    response::{IntoResponse, Response},
};

/// GET /raw/:id handler - Retrieve only the document text
pub async fn raw_handler(state: AppState, id: String) -> Result<Response, ApiError> {
    match state.documents.get(&id).await? {
        Some(document) => {
            tracing::info!("Retrieved raw document {}", document.key);
            Ok(([(header::CONTENT_TYPE, "text/plain")], document.data).into_response())
        }
        None => {
            tracing::info!("Raw document not found with id: {:?}", id);
            Ok(Json(MessageResponse::document_not_found()).into_response())
        }
    }
}
