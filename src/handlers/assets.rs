use crate::assets::{Asset, AssetOptions, AssetRequest};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Headers forced onto every directly matched asset
pub const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-xss-protection", "1; mode=block"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "unsafe-url"),
    ("feature-policy", "none"),
];

/// Fallback handler - Serve the static site for every unmatched request
///
/// A miss is retried once against `index.html` so client-side routes load the
/// single-page app. That retry is served as-is, without security headers. When
/// both lookups fail the response is a 500 carrying the first failure's text.
pub async fn asset_handler(state: AppState, request: Request) -> Response {
    let asset_request = AssetRequest::new(request.method().clone(), request.uri().path());

    let first_error = match state
        .assets
        .get_asset(&asset_request, &AssetOptions::default())
        .await
    {
        Ok(asset) => {
            let mut response = asset_response(asset);
            apply_security_headers(response.headers_mut());
            return response;
        }
        Err(err) => err,
    };

    tracing::debug!(
        "Asset lookup failed for {}: {}; trying index.html",
        asset_request.path,
        first_error
    );

    match state
        .assets
        .get_asset(&asset_request, &AssetOptions::single_page_app())
        .await
    {
        Ok(asset) => asset_response(asset),
        Err(retry_error) => {
            tracing::error!(
                "index.html fallback failed for {}: {}",
                asset_request.path,
                retry_error
            );
            (StatusCode::INTERNAL_SERVER_ERROR, first_error.to_string()).into_response()
        }
    }
}

fn asset_response(asset: Asset) -> Response {
    let mut response = Response::new(Body::from(asset.body));
    *response.status_mut() = asset.status;
    *response.headers_mut() = asset.headers;
    response
}

fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
}
