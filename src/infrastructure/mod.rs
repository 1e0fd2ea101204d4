pub mod config;
pub mod document_database;

pub use config::{AppConfig, CorsConfig, FirestoreConfig, ServerConfig};
pub use document_database::{connect_firestore, FirestoreDatabase, InMemoryDocumentDatabase};
