//! Flat-file storage for the synced document with rolling backups.

pub mod documents;
pub mod errors;

pub use documents::{DocumentFileStore, DocumentRepository, MAX_BACKUPS};
pub use errors::StorageError;
