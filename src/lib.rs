//! Thin facade over a managed document database.
//!
//! [`application::DocumentStoreClient`] lists, addresses, reads and
//! overwrites documents through the [`domain::ports::DocumentDatabase`] port.
//! Firestore and in-memory adapters live in [`infrastructure`].

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
