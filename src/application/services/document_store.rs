use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    entities::{require_collection, require_project_id, DATA_FIELD},
    ports::DocumentDatabase,
    DocumentRef, DomainError, Payload, Result, StoredDocument,
};

/// What `save_document` does when the database rejects a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveFailurePolicy {
    /// Return [`DomainError::Persistence`] to the caller.
    #[default]
    Propagate,
    /// Log the failure at error level and report success.
    LogAndSwallow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Fail with [`DomainError::DataMissing`] instead of returning `None`
    /// when a read finds no `data` field.
    pub strict_read: bool,
    pub save_failure: SaveFailurePolicy,
}

/// Single-pass listing of the references in a collection.
#[derive(Debug)]
pub struct DocumentRefs(std::vec::IntoIter<DocumentRef>);

impl Iterator for DocumentRefs {
    type Item = DocumentRef;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for DocumentRefs {}

pub struct DocumentStoreClient {
    project_id: String,
    database: Arc<dyn DocumentDatabase>,
    options: ClientOptions,
}

impl DocumentStoreClient {
    /// Validates `project_id`, then asks `connector` for a database client
    /// scoped to it. The connector is never called for an empty id.
    pub fn connect<F>(
        project_id: Option<&str>,
        options: ClientOptions,
        connector: F,
    ) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<Arc<dyn DocumentDatabase>>,
    {
        let project_id = require_project_id(project_id)?;

        let database = connector(project_id)?;
        tracing::info!(project_id, "document store connected");

        Ok(Self {
            project_id: project_id.to_string(),
            database,
            options,
        })
    }

    pub fn new(project_id: &str, database: Arc<dyn DocumentDatabase>) -> Result<Self> {
        Self::connect(Some(project_id), ClientOptions::default(), |_| Ok(database))
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn options(&self) -> ClientOptions {
        self.options
    }

    #[instrument(skip(self))]
    pub async fn list_documents(&self, collection: &str) -> Result<DocumentRefs> {
        require_collection(collection)?;
        let references = self.database.list_documents(collection).await?;
        tracing::debug!(count = references.len(), "listed documents");
        Ok(DocumentRefs(references.into_iter()))
    }

    /// Handle for [`read_reference`](Self::read_reference) and
    /// [`save_to`](Self::save_to).
    pub fn document_reference(&self, collection: &str, document: &str) -> Result<DocumentRef> {
        DocumentRef::new(collection, document)
    }

    /// Returns the `data` field of the addressed document.
    pub async fn read_document(&self, collection: &str, document: &str) -> Result<Option<Value>> {
        let reference = DocumentRef::new(collection, document)?;
        self.read_reference(&reference).await
    }

    #[instrument(skip(self, reference), fields(document = %reference))]
    pub async fn read_reference(&self, reference: &DocumentRef) -> Result<Option<Value>> {
        let data = self
            .database
            .get(reference)
            .await?
            .and_then(|mut fields| fields.remove(DATA_FIELD));

        match data {
            Some(data) => Ok(Some(data)),
            None if self.options.strict_read => Err(DomainError::data_missing(
                reference.collection(),
                reference.name(),
            )),
            None => {
                tracing::debug!("document has no data");
                Ok(None)
            }
        }
    }

    /// Normalizes `data` and overwrites the whole document with
    /// `{ data, updated }`.
    pub async fn save_document(
        &self,
        collection: &str,
        document: &str,
        data: impl Into<Payload>,
    ) -> Result<()> {
        let reference = DocumentRef::new(collection, document)?;
        self.save_to(&reference, data).await
    }

    #[instrument(skip(self, reference, data), fields(document = %reference))]
    pub async fn save_to(&self, reference: &DocumentRef, data: impl Into<Payload>) -> Result<()> {
        let stored = StoredDocument::new(data.into().normalize(), Utc::now());

        let Err(cause) = self.database.set(reference, stored).await else {
            tracing::debug!("document saved");
            return Ok(());
        };

        let err = DomainError::persistence(reference.collection(), reference.name(), cause);
        match self.options.save_failure {
            SaveFailurePolicy::Propagate => Err(err),
            SaveFailurePolicy::LogAndSwallow => {
                tracing::error!(
                    collection = reference.collection(),
                    document = reference.name(),
                    "{err}"
                );
                tracing::error!(cause_chain = %cause_chain(&err), "save failure cause chain");
                Ok(())
            }
        }
    }
}

/// Sources below `err`, outermost first. `err`'s own message is not repeated.
fn cause_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain.join(" <- ")
}
