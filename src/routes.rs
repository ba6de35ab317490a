// Route path constants and request classification.
//
// Every request enters through `dispatch`; `classify` alone decides which
// handler runs, so routing can be tested without a transport.

use axum::Router;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub const DOCUMENTS: &str = "/documents";
pub const DOCUMENTS_SEGMENT: &str = "documents";
pub const RAW_SEGMENT: &str = "raw";

/// The handler selected for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    CreateDocument,
    GetDocument(String),
    GetRawDocument(String),
    StaticAsset,
}

pub fn classify(method: &Method, path: &str) -> Route {
    if *method == Method::POST && path.to_lowercase() == DOCUMENTS {
        return Route::CreateDocument;
    }

    if *method == Method::GET {
        let lowered = path.to_lowercase();
        let trimmed = lowered.strip_prefix('/').unwrap_or(&lowered);
        let segments: Vec<&str> = trimmed.split('/').collect();

        if let [first, id] = segments.as_slice() {
            match *first {
                DOCUMENTS_SEGMENT => return Route::GetDocument(extract_id(id)),
                RAW_SEGMENT => return Route::GetRawDocument(extract_id(id)),
                _ => {}
            }
        }
    }

    Route::StaticAsset
}

/// Document id from a path segment: everything before the first `.`, lowercased
///
/// `abc123.txt` and `ABC123` both yield `abc123`.
pub fn extract_id(segment: &str) -> String {
    segment
        .split('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Single entry point for every request
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let route = classify(request.method(), request.uri().path());
    tracing::debug!("{} {} -> {:?}", request.method(), request.uri().path(), route);

    match route {
        Route::CreateDocument => handlers::create_handler(state, request)
            .await
            .into_response(),
        Route::GetDocument(id) => handlers::get_handler(state, id).await.into_response(),
        Route::GetRawDocument(id) => handlers::raw_handler(state, id).await.into_response(),
        Route::StaticAsset => handlers::asset_handler(state, request).await,
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
