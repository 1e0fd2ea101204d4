use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::domain::{ports::DocumentDatabase, DocumentRef, DomainError, StoredDocument};

type Collections = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

/// Process-local database. Collections appear on first write.
pub struct InMemoryDocumentDatabase {
    collections: RwLock<Collections>,
    interactions: AtomicUsize,
    write_failure: RwLock<Option<String>>,
}

impl InMemoryDocumentDatabase {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            interactions: AtomicUsize::new(0),
            write_failure: RwLock::new(None),
        }
    }

    /// Number of calls made through [`DocumentDatabase`].
    pub fn interactions(&self) -> usize {
        self.interactions.load(Ordering::SeqCst)
    }

    /// Makes every following `set` fail with `message`.
    #[cfg(test)]
    pub fn fail_writes(&self, message: impl Into<String>) {
        if let Ok(mut failure) = self.write_failure.write() {
            *failure = Some(message.into());
        }
    }

    /// Stored fields, bypassing the interaction counter.
    #[cfg(test)]
    pub fn snapshot(&self, reference: &DocumentRef) -> Option<Map<String, Value>> {
        let store = self.collections.read().ok()?;
        store
            .get(reference.collection())
            .and_then(|docs| docs.get(reference.name()))
            .cloned()
    }

    /// Stores arbitrary fields, e.g. documents written by other tools.
    #[cfg(test)]
    pub fn insert_raw(&self, reference: &DocumentRef, fields: Map<String, Value>) {
        if let Ok(mut store) = self.collections.write() {
            store
                .entry(reference.collection().to_string())
                .or_default()
                .insert(reference.name().to_string(), fields);
        }
    }

    fn touch(&self) {
        self.interactions.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryDocumentDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentDatabase for InMemoryDocumentDatabase {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRef>, DomainError> {
        self.touch();
        let store = self
            .collections
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        store
            .get(collection)
            .map(|docs| {
                docs.keys()
                    .map(|name| DocumentRef::new(collection, name))
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get(
        &self,
        reference: &DocumentRef,
    ) -> Result<Option<Map<String, Value>>, DomainError> {
        self.touch();
        let store = self
            .collections
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(store
            .get(reference.collection())
            .and_then(|docs| docs.get(reference.name()))
            .cloned())
    }

    async fn set(
        &self,
        reference: &DocumentRef,
        document: StoredDocument,
    ) -> Result<(), DomainError> {
        self.touch();
        if let Some(message) = self
            .write_failure
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .clone()
        {
            return Err(DomainError::external(message));
        }

        let mut store = self
            .collections
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        store
            .entry(reference.collection().to_string())
            .or_default()
            .insert(reference.name().to_string(), document.into_fields());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        let db = InMemoryDocumentDatabase::new();
        let reference = DocumentRef::new("alerts", "alert-1").unwrap();

        db.set(&reference, StoredDocument::new(json!({"a": 1}), Utc::now()))
            .await
            .unwrap();

        let fields = db.get(&reference).await.unwrap().unwrap();
        assert_eq!(fields["data"], json!({"a": 1}));
        assert_eq!(db.interactions(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_untouched() {
        let db = InMemoryDocumentDatabase::new();
        let reference = DocumentRef::new("alerts", "alert-1").unwrap();
        db.fail_writes("unavailable");

        let err = db
            .set(&reference, StoredDocument::new(json!(1), Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ExternalService(_)));
        assert!(db.snapshot(&reference).is_none());
    }
}
