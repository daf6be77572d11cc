//! Error types for the sync client crate.

use thiserror::Error;

/// Result type alias for sync client operations.
pub type Result<T> = std::result::Result<T, SyncClientError>;

/// Errors that can occur while talking to the sync API.
#[derive(Debug, Error)]
pub enum SyncClientError {
    /// HTTP client error (connect failure, timeout, broken body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the sync API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (bad configuration, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Credential could not be attached to the request
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Host dataset could not be read or replaced
    #[error("Local dataset error: {0}")]
    Dataset(String),
}

impl SyncClientError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(err) if err.is_timeout())
    }

    /// The server refused the credential (401/403), or it could not be sent at all.
    pub fn is_auth_rejected(&self) -> bool {
        match self {
            Self::Api { status, .. } => matches!(status, 401 | 403),
            Self::Auth(_) => true,
            _ => false,
        }
    }
}
