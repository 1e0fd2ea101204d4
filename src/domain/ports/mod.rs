mod document_database;

pub use document_database::DocumentDatabase;
