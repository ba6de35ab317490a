use crate::error::ApiError;
use crate::models::MessageResponse;
use crate::state::AppState;
use axum::{
    Json,
    response::{IntoResponse, Response},
};

/// GET /documents/:id handler - Retrieve a document with its key
///
/// A missing document is answered with status 200 and a message body.
pub async fn get_handler(state: AppState, id: String) -> Result<Response, ApiError> {
    match state.documents.get(&id).await? {
        Some(document) => {
            tracing::info!("Retrieved document {}", document.key);
            Ok(Json(document).into_response())
        }
        None => {
            tracing::info!("Document not found with id: {:?}", id);
            Ok(Json(MessageResponse::document_not_found()).into_response())
        }
    }
}
