mod backups;
mod repository;
mod store;

pub use backups::{list_backups, MAX_BACKUPS};
pub use repository::DocumentRepository;
pub use store::{DocumentFileStore, BACKUP_DIR_NAME, DOCUMENT_FILE_NAME};
