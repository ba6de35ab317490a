use crate::error::ApiError;
use crate::models::CreateResponse;
use crate::state::AppState;
use axum::{Json, extract::Request};

/// POST /documents handler - Store the request body as a new document
///
/// The body is taken as text without any size or emptiness check. Invalid
/// UTF-8 is replaced rather than rejected.
pub async fn create_handler(
    state: AppState,
    request: Request,
) -> Result<Json<CreateResponse>, ApiError> {
    let bytes = axum::body::to_bytes(request.into_body(), usize::MAX).await?;
    let content = String::from_utf8_lossy(&bytes);

    let key = state.documents.create(&content).await?;

    tracing::info!("Created document {} ({} bytes)", key, bytes.len());
    Ok(Json(CreateResponse { key }))
}
