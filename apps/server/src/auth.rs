//! Shared-secret check applied before any action runs.

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::ApiError;
use crate::main_lib::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY_PARAM: &str = "api_key";

/// SHA-256 of the configured key; the plain key is not kept.
#[derive(Clone)]
pub struct ApiKeyDigest([u8; 32]);

impl std::fmt::Debug for ApiKeyDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKeyDigest(..)")
    }
}

impl ApiKeyDigest {
    pub fn new(key: &str) -> Self {
        Self(Sha256::digest(key.as_bytes()).into())
    }

    /// Compares digests in constant time.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        self.0
            .iter()
            .zip(candidate.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[derive(Debug, Deserialize)]
struct KeyQuery {
    api_key: Option<String>,
}

/// Header first, then the `api_key` query parameter.
fn provided_key(request: &Request) -> Option<String> {
    if let Some(value) = request.headers().get(API_KEY_HEADER) {
        return value.to_str().ok().map(str::to_string);
    }
    Query::<KeyQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.api_key)
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    match provided_key(&request) {
        Some(key) if state.api_key.matches(&key) => next.run(request).await,
        _ => {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected request with missing or invalid {}",
                API_KEY_QUERY_PARAM
            );
            ApiError::Unauthorized("invalid api key".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(value) = header {
            builder = builder.header(API_KEY_HEADER, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn digest_matches_only_the_same_key() {
        let digest = ApiKeyDigest::new("s3cret");
        assert!(digest.matches("s3cret"));
        assert!(!digest.matches("s3cret "));
        assert!(!digest.matches(""));
    }

    #[test]
    fn header_takes_precedence_over_query() {
        let req = request("/api?action=test&api_key=from-query", Some("from-header"));
        assert_eq!(provided_key(&req).as_deref(), Some("from-header"));

        let req = request("/api?action=test&api_key=from%20query", None);
        assert_eq!(provided_key(&req).as_deref(), Some("from query"));

        let req = request("/api?action=test", None);
        assert_eq!(provided_key(&req), None);
    }
}
