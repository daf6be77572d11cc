//! Core domain for LiftSync: the synced document model, repository contracts
//! and the vocabulary shared by the sync client and server.

pub mod clock;
pub mod documents;
pub mod errors;
pub mod sync;

pub use errors::{Error, Result};
