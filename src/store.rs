use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::keygen::KeyGenerator;

/// Durable key-value storage the document store writes through
///
/// Implementations report connectivity or write failures as errors. A missing
/// key is `Ok(None)`, never an error.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// A stored paste, as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub data: String,
    pub key: String,
}

/// Create/read contract over a [`KvBackend`]
///
/// Documents are only ever created and read. There is no update or delete.
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn KvBackend>,
    keys: KeyGenerator,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn KvBackend>, keys: KeyGenerator) -> Self {
        Self { backend, keys }
    }

    /// Store `content` under a freshly generated key and return the key
    ///
    /// # Errors
    /// Returns the backend error if the write fails. No retry is attempted.
    pub async fn create(&self, content: &str) -> Result<String> {
        let key = self.keys.generate();
        self.backend.put(&key, content).await?;
        tracing::debug!("Stored document {} ({} bytes)", key, content.len());
        Ok(key)
    }

    /// Look up a document by key
    ///
    /// # Returns
    /// * `Ok(Some(doc))` - document found, `doc.key` is the lowercased key
    /// * `Ok(None)` - nothing stored under the key (including the empty key)
    /// * `Err(_)` - the backend failed
    pub async fn get(&self, key: &str) -> Result<Option<Document>> {
        if key.is_empty() {
            return Ok(None);
        }

        let data = self.backend.get(key).await?;
        Ok(data.map(|data| Document {
            data,
            key: key.to_lowercase(),
        }))
    }
}
