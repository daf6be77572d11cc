use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure leaves the router as `{success: false, error}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    CorruptData(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::CorruptData(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<liftsync_core::Error> for ApiError {
    fn from(err: liftsync_core::Error) -> Self {
        match err {
            liftsync_core::Error::Validation(message) => Self::BadRequest(message),
            liftsync_core::Error::CorruptData(message) => Self::CorruptData(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (
            status,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_http_statuses() {
        let bad: ApiError = liftsync_core::Error::validation("User id must not be empty").into();
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let corrupt: ApiError = liftsync_core::Error::CorruptData("broken".to_string()).into();
        assert_eq!(corrupt.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(corrupt.to_string(), "broken");

        let too_large = ApiError::PayloadTooLarge("request body too large".to_string());
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let storage: ApiError = liftsync_core::Error::storage("disk").into();
        assert!(matches!(storage, ApiError::Internal(_)));
    }
}
