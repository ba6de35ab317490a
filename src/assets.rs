use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// The parts of an incoming request an asset lookup depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub method: Method,
    pub path: String,
}

impl AssetRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

pub type PathRewrite = fn(AssetRequest) -> AssetRequest;

/// Options for a single asset lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetOptions {
    /// Applied to the request before the asset path is resolved
    pub path_rewrite: Option<PathRewrite>,
}

impl AssetOptions {
    pub fn single_page_app() -> Self {
        Self {
            path_rewrite: Some(serve_single_page_app),
        }
    }
}

/// Rewrite any request to the site entry point
pub fn serve_single_page_app(request: AssetRequest) -> AssetRequest {
    AssetRequest {
        path: "/index.html".to_string(),
        ..request
    }
}

/// An asset body together with the response metadata it should be served with
#[derive(Debug, Clone)]
pub struct Asset {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("could not find {0} in your asset directory")]
    NotFound(String),

    #[error("{0} is not a valid request method")]
    MethodNotAllowed(Method),

    #[error("failed to read asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of pre-built site files
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn get_asset(
        &self,
        request: &AssetRequest,
        options: &AssetOptions,
    ) -> Result<Asset, AssetError>;
}

/// Serves files from a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a request path to a file under the root
    ///
    /// Directory paths and extensionless paths resolve to an `index.html`
    /// (`/about` -> `about/index.html`). Returns `None` for paths that try to
    /// climb out of the root.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let mut relative = request_path.trim_start_matches('/').to_string();
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str("index.html");
        } else if !has_extension(&relative) {
            relative.push_str("/index.html");
        }

        let mut resolved = self.root.clone();
        for component in Path::new(&relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }
}

#[async_trait]
impl AssetSource for DirAssetSource {
    async fn get_asset(
        &self,
        request: &AssetRequest,
        options: &AssetOptions,
    ) -> Result<Asset, AssetError> {
        let request = match options.path_rewrite {
            Some(rewrite) => rewrite(request.clone()),
            None => request.clone(),
        };

        if request.method != Method::GET && request.method != Method::HEAD {
            return Err(AssetError::MethodNotAllowed(request.method));
        }

        let not_found = || AssetError::NotFound(request.path.clone());

        let file_path = self.resolve(&request.path).ok_or_else(not_found)?;

        // Symlinks may still point outside the root
        let (Ok(root), Ok(canonical)) = (
            tokio::fs::canonicalize(&self.root).await,
            tokio::fs::canonicalize(&file_path).await,
        ) else {
            return Err(not_found());
        };
        if !canonical.starts_with(&root) {
            tracing::warn!(
                "Path traversal attempt blocked: {} -> {}",
                request.path,
                canonical.display()
            );
            return Err(not_found());
        }
        match tokio::fs::metadata(&canonical).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => return Err(not_found()),
        }

        let body = match tokio::fs::read(&canonical).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(source) => {
                return Err(AssetError::Io {
                    path: request.path.clone(),
                    source,
                });
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type(canonical.extension().and_then(|e| e.to_str()))),
        );

        tracing::debug!("Serving asset {} ({} bytes)", request.path, body.len());

        Ok(Asset {
            status: StatusCode::OK,
            headers,
            body: Bytes::from(body),
        })
    }
}

fn has_extension(relative: &str) -> bool {
    relative
        .rsplit('/')
        .next()
        .and_then(|last| Path::new(last).extension())
        .is_some()
}

/// Content-Type for a file extension
pub fn content_type(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript",
        Some("json" | "map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("wasm") => "application/wasm",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<html>docs</html>").unwrap();
        dir
    }

    async fn fetch(source: &DirAssetSource, method: Method, path: &str) -> Result<Asset, AssetError> {
        source
            .get_asset(&AssetRequest::new(method, path), &AssetOptions::default())
            .await
    }

    #[tokio::test]
    async fn test_serves_file_with_content_type() {
        let dir = site();
        let source = DirAssetSource::new(dir.path());

        let asset = fetch(&source, Method::GET, "/app.js").await.unwrap();

        assert_eq!(asset.status, StatusCode::OK);
        assert_eq!(asset.body, Bytes::from("console.log(1)"));
        assert_eq!(
            asset.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/javascript"
        );
    }

    #[tokio::test]
    async fn test_directory_paths_serve_index() {
        let dir = site();
        let source = DirAssetSource::new(dir.path());

        let root = fetch(&source, Method::GET, "/").await.unwrap();
        assert_eq!(root.body, Bytes::from("<html>app</html>"));

        let docs = fetch(&source, Method::HEAD, "/docs/").await.unwrap();
        assert_eq!(docs.body, Bytes::from("<html>docs</html>"));
    }

    #[tokio::test]
    async fn test_extensionless_paths_serve_nested_index() {
        let dir = site();
        let source = DirAssetSource::new(dir.path());

        let docs = fetch(&source, Method::GET, "/docs").await.unwrap();
        assert_eq!(docs.body, Bytes::from("<html>docs</html>"));
        assert_eq!(
            docs.headers.get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = site();
        let source = DirAssetSource::new(dir.path());

        let err = fetch(&source, Method::GET, "/nonexistent-page").await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
        assert_eq!(
            err.to_string(),
            "could not find /nonexistent-page in your asset directory"
        );
    }

    #[tokio::test]
    async fn test_directory_without_index_is_not_found() {
        let dir = site();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let source = DirAssetSource::new(dir.path());

        let err = fetch(&source, Method::GET, "/empty").await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_parent_segments_rejected() {
        let dir = site();
        let source = DirAssetSource::new(dir.path().join("docs"));

        let err = fetch(&source, Method::GET, "/../app.js").await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_only_get_and_head() {
        let dir = site();
        let source = DirAssetSource::new(dir.path());

        let err = fetch(&source, Method::POST, "/app.js").await.unwrap_err();
        assert!(matches!(err, AssetError::MethodNotAllowed(Method::POST)));
        assert_eq!(err.to_string(), "POST is not a valid request method");
    }

    #[tokio::test]
    async fn test_single_page_app_rewrite() {
        let dir = site();
        let source = DirAssetSource::new(dir.path());

        let asset = source
            .get_asset(
                &AssetRequest::new(Method::GET, "/some/client/route"),
                &AssetOptions::single_page_app(),
            )
            .await
            .unwrap();

        assert_eq!(asset.body, Bytes::from("<html>app</html>"));
        assert_eq!(
            asset.headers.get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_missing_root() {
        let source = DirAssetSource::new("/definitely/not/a/real/site/root");

        let err = fetch(&source, Method::GET, "/index.html").await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("app.js"));
        assert!(has_extension("docs/guide.html"));
        assert!(!has_extension("docs"));
        assert!(!has_extension("v1.2/docs"));
        assert!(!has_extension(".hidden"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Some("HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type(Some("svg")), "image/svg+xml");
        assert_eq!(content_type(Some("bin")), "application/octet-stream");
        assert_eq!(content_type(None), "application/octet-stream");
    }
}
