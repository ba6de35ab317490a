use crate::assets::AssetSource;
use crate::store::DocumentStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentStore,
    pub assets: Arc<dyn AssetSource>,
}
