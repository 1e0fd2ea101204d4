mod document_store;

pub use document_store::{ClientOptions, DocumentRefs, DocumentStoreClient, SaveFailurePolicy};
