//! Shared state and router assembly.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    middleware, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use liftsync_core::clock::{Clock, SystemClock};
use liftsync_core::documents::DocumentRepositoryTrait;
use liftsync_storage_fs::{DocumentFileStore, DocumentRepository};

use crate::api;
use crate::auth::{self, ApiKeyDigest, API_KEY_HEADER};
use crate::config::{ServerConfig, DEFAULT_MAX_BODY_BYTES};

pub struct AppState {
    pub document_repository: Arc<dyn DocumentRepositoryTrait>,
    pub clock: Arc<dyn Clock>,
    pub api_key: ApiKeyDigest,
    pub allowed_origin: Option<HeaderValue>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        document_repository: Arc<dyn DocumentRepositoryTrait>,
        clock: Arc<dyn Clock>,
        api_key: &str,
    ) -> Self {
        Self {
            document_repository,
            clock,
            api_key: ApiKeyDigest::new(api_key),
            allowed_origin: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_allowed_origin(mut self, origin: Option<HeaderValue>) -> Self {
        self.allowed_origin = origin;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// File-backed state for a configured server.
pub fn build_state(config: &ServerConfig) -> Arc<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = DocumentFileStore::with_clock(&config.data_dir, Arc::clone(&clock));
    let repository = Arc::new(DocumentRepository::new(store));

    Arc::new(
        AppState::new(repository, clock, &config.api_key)
            .with_allowed_origin(config.allowed_origin.clone())
            .with_max_body_bytes(config.max_body_bytes),
    )
}

fn cors_layer(allowed_origin: Option<&HeaderValue>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)]);
    match allowed_origin {
        Some(origin) => cors.allow_origin(origin.clone()),
        None => cors,
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.allowed_origin.as_ref());

    api::router()
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_api_key,
        ))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
