//! Application layer - the document store facade.
//!
//! Services here validate input and delegate to the `DocumentDatabase` port
//! rather than to a concrete database client.

pub mod services;

pub use services::{ClientOptions, DocumentRefs, DocumentStoreClient, SaveFailurePolicy};
