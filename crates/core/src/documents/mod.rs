//! Synced document model and repository contract.

mod documents_model;
mod documents_stats;
mod documents_traits;

pub use documents_model::*;
pub use documents_stats::*;
pub use documents_traits::*;
