//! LiftSync HTTP action router.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod main_lib;

pub use config::ServerConfig;
pub use main_lib::{build_router, build_state, AppState};
