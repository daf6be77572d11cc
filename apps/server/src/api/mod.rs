use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Router};

use crate::main_lib::AppState;

mod actions;

pub use actions::{handle_action, Action, ActionQuery};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handle_action)
                .post(handle_action)
                .options(|| async { StatusCode::OK }),
        )
        .route(
            "/api",
            get(handle_action)
                .post(handle_action)
                .options(|| async { StatusCode::OK }),
        )
}
