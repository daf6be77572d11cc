//! Client side of LiftSync: the HTTP API client and the sync session that
//! gates every network call on server availability.

pub mod auto_sync;
pub mod client;
pub mod dataset;
pub mod error;
pub mod session;
pub mod status;
pub mod types;

#[cfg(test)]
mod test_support;

pub use auto_sync::AutoSync;
pub use client::SyncApiClient;
pub use dataset::{InMemoryDataset, LocalDataset};
pub use error::{Result, SyncClientError};
pub use session::SyncSession;
pub use status::SyncStatusSink;
pub use types::*;

pub use liftsync_core::sync::{SyncCycleTrigger, SyncOutcome, SyncSeverity};
