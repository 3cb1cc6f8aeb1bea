//! Document stores that accept registration writes.

mod firestore;
mod memory;

use crate::error::StoreError;
use crate::model::{DocumentRef, StoredRegistration};
use async_trait::async_trait;

pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;

/// Collection every registration is written to.
pub const REGISTRATIONS_COLLECTION: &str = "registrations";

/// Create-one-document persistence. Append only: there is no read, update or delete.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(
        &self,
        collection: &str,
        doc: &StoredRegistration,
    ) -> Result<DocumentRef, StoreError>;
}
