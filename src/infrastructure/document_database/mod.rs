mod firestore;
mod firestore_value;
mod in_memory;

use std::sync::Arc;

pub use firestore::{
    AccessTokenSource, ApplicationDefaultCredentials, FirestoreDatabase, StaticToken,
};
pub use in_memory::InMemoryDocumentDatabase;

use crate::application::DocumentStoreClient;
use crate::domain::{ports::DocumentDatabase, require_project_id, DomainError};
use crate::infrastructure::config::AppConfig;

/// Builds a client backed by Firestore from the loaded configuration.
/// The project id is checked before any credential lookup.
pub async fn connect_firestore(config: &AppConfig) -> Result<DocumentStoreClient, DomainError> {
    let project_id = require_project_id(config.firestore.project_id.as_deref())?;
    let database = FirestoreDatabase::connect(project_id, &config.firestore).await?;

    DocumentStoreClient::connect(Some(project_id), config.client, |_| {
        Ok(Arc::new(database) as Arc<dyn DocumentDatabase>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_project_id() {
        let result = connect_firestore(&AppConfig::default()).await;
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_connect_to_emulator() {
        let mut config = AppConfig::default();
        config.firestore.project_id = Some("demo".into());
        config.firestore.emulator_host = Some("localhost:8080".into());

        let client = connect_firestore(&config).await.unwrap();
        assert_eq!(client.project_id(), "demo");
    }
}
