//! Dispatch for the single action endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use liftsync_core::documents::{compute_stats, format_timestamp, DEFAULT_USER_ID};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Test,
    Load,
    Save,
    Backup,
    Stats,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "test" => Some(Self::Test),
            "load" => Some(Self::Load),
            "save" => Some(Self::Save),
            "backup" => Some(Self::Backup),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Load => "load",
            Self::Save => "save",
            Self::Backup => "backup",
            Self::Stats => "stats",
        }
    }
}

/// Request body, when there is one. `Invalid` keeps save from treating junk as "no data".
enum RequestBody {
    Empty,
    Json(Value),
    Invalid,
}

impl RequestBody {
    fn parse(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Invalid,
        }
    }

    fn str_field(&self, name: &str) -> Option<String> {
        match self {
            Self::Json(value) => value.get(name)?.as_str().map(str::to_string),
            _ => None,
        }
    }
}

fn body_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("request body too large".to_string())
    } else {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn handle_action(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ActionQuery>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let body = body.map_err(body_rejection)?;
    let body = RequestBody::parse(&body);
    let action_name =
        non_empty(query.action).or_else(|| non_empty(body.str_field("action")));
    let user = non_empty(query.user)
        .or_else(|| non_empty(body.str_field("user")))
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

    let Some(action) = action_name.as_deref().and_then(Action::parse) else {
        debug!(action = ?action_name, "Unknown action");
        return Err(ApiError::BadRequest("invalid action".to_string()));
    };
    info!(action = action.as_str(), user = %user, "Dispatching action");

    match action {
        Action::Test => test(&state),
        Action::Load => load(&state, &user).await,
        Action::Save => save(&state, &user, body).await,
        Action::Backup => backup(&state).await,
        Action::Stats => stats(&state).await,
    }
}

fn test(state: &AppState) -> ApiResult<Response> {
    Ok(Json(json!({
        "success": true,
        "message": "api online",
        "version": API_VERSION,
        "timestamp": format_timestamp(state.clock.now()),
    }))
    .into_response())
}

async fn load(state: &AppState, user: &str) -> ApiResult<Response> {
    let document = state.document_repository.load_document().await?;
    let body = match document.user(user) {
        Some(record) => json!({
            "success": true,
            "data": record.data,
            "lastUpdate": record.last_update,
        }),
        None => json!({ "success": false, "error": "user not found" }),
    };
    Ok(Json(body).into_response())
}

async fn save(state: &AppState, user: &str, body: RequestBody) -> ApiResult<Response> {
    let data = match body {
        RequestBody::Json(mut value) => value.get_mut("data").map(Value::take),
        RequestBody::Invalid => {
            return Err(ApiError::BadRequest("invalid JSON body".to_string()));
        }
        RequestBody::Empty => None,
    };
    let Some(data) = data.filter(|d| !d.is_null()) else {
        return Err(ApiError::BadRequest("missing data".to_string()));
    };

    let record = state
        .document_repository
        .upsert_user_record(user, data)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "data saved",
        "lastUpdate": record.last_update,
    }))
    .into_response())
}

async fn backup(state: &AppState) -> ApiResult<Response> {
    let document = state.document_repository.load_document().await?;
    let content = serde_json::to_string_pretty(&document)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize document: {}", e)))?;
    let file_name = format!(
        "liftsync-backup-{}.json",
        state.clock.now().format("%Y-%m-%d")
    );

    Ok((
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        content,
    )
        .into_response())
}

async fn stats(state: &AppState) -> ApiResult<Response> {
    let document = state.document_repository.load_document().await?;
    Ok(Json(json!({
        "success": true,
        "stats": compute_stats(&document),
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_round_trip() {
        for action in [
            Action::Test,
            Action::Load,
            Action::Save,
            Action::Backup,
            Action::Stats,
        ] {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
        assert_eq!(Action::parse("delete"), None);
        assert_eq!(Action::parse("TEST"), None);
    }

    #[test]
    fn body_fields_are_read_only_from_json_objects() {
        let body = RequestBody::parse(br#"{"action": "save", "user": "anna"}"#);
        assert_eq!(body.str_field("action").as_deref(), Some("save"));
        assert_eq!(body.str_field("user").as_deref(), Some("anna"));

        assert!(matches!(RequestBody::parse(b"  \n"), RequestBody::Empty));
        assert!(matches!(RequestBody::parse(b"{oops"), RequestBody::Invalid));
        assert_eq!(RequestBody::parse(b"[1]").str_field("action"), None);
    }
}
