use serde::{Deserialize, Serialize};

pub const DOCUMENT_NOT_FOUND: &str = "Document not found.";

/// Response type for a created document
#[derive(Serialize, Deserialize)]
pub struct CreateResponse {
    pub key: String,
}

/// Informational body for lookups that found nothing
#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn document_not_found() -> Self {
        Self {
            message: DOCUMENT_NOT_FOUND.to_string(),
        }
    }
}
