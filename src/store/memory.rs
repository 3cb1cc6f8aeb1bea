use super::DocumentStore;
use crate::error::StoreError;
use crate::model::{DocumentRef, StoredRegistration};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-process store used by `--dry-run` and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<(String, StoredRegistration)>>,
    fail_with: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write with `message`.
    #[cfg(test)]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            docs: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Every write attempt that succeeded, as (collection, document).
    #[cfg(test)]
    pub fn documents(&self) -> Vec<(String, StoredRegistration)> {
        self.docs
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    #[cfg_attr(not(feature = "tui"), allow(dead_code))]
    pub fn len(&self) -> usize {
        self.docs.lock().map(|d| d.len()).unwrap_or(0)
    }

    #[cfg_attr(not(feature = "tui"), allow(dead_code))]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(
        &self,
        collection: &str,
        doc: &StoredRegistration,
    ) -> Result<DocumentRef, StoreError> {
        if let Some(msg) = &self.fail_with {
            return Err(StoreError::rejected(msg.clone()));
        }
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| StoreError::Transport("memory store poisoned".into()))?;
        docs.push((collection.to_string(), doc.clone()));
        Ok(DocumentRef::new(format!(
            "memory/{collection}/{:06}",
            docs.len()
        )))
    }
}
