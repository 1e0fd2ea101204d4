use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{errors::DomainError, DocumentRef, StoredDocument};

/// Client seam onto the managed document database.
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRef>, DomainError>;

    /// Top-level fields of the document, `None` when it does not exist.
    async fn get(&self, reference: &DocumentRef)
        -> Result<Option<Map<String, Value>>, DomainError>;

    /// Replaces the whole document body, creating the document if needed.
    async fn set(&self, reference: &DocumentRef, document: StoredDocument)
        -> Result<(), DomainError>;
}
