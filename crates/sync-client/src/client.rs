//! HTTP client for the LiftSync action API.

use std::time::Duration;

use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use liftsync_core::sync::SYNC_REQUEST_TIMEOUT_SECS;

use crate::error::{Result, SyncClientError};
use crate::types::{
    ApiErrorResponse, LoadResponse, SaveRequest, SaveResponse, StatsResponse, TestResponse,
};

const MAX_LOG_BODY_CHARS: usize = 512;
const API_KEY_HEADER: &str = "x-api-key";

/// Thin wrapper over the single action endpoint.
#[derive(Debug, Clone)]
pub struct SyncApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SyncApiClient {
    /// Build a client for `endpoint` (e.g. `https://host/api`) with the default timeout.
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        Self::with_timeout(
            endpoint,
            api_key,
            Duration::from_secs(SYNC_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(SyncClientError::invalid_request("Server URL is empty"));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[Sync] API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[Sync] API response error ({}): {}", status, preview);
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| SyncClientError::auth("Invalid API key format"))?;
        headers.insert(API_KEY_HEADER, key);
        Ok(headers)
    }

    fn action_url(&self, action: &str, user: Option<&str>) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{}{}action={}",
            self.endpoint,
            separator,
            urlencoding::encode(action)
        );
        if let Some(user) = user {
            url.push_str("&user=");
            url.push_str(&urlencoding::encode(user));
        }
        url
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(SyncClientError::api(status.as_u16(), error.error));
            }
            return Err(SyncClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("[Sync] Failed to deserialize response: {}", e);
            SyncClientError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    async fn parse_binary_response(response: reqwest::Response) -> Result<Vec<u8>> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }

        let body = response.text().await?;
        Self::log_response(status, &body);
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
            return Err(SyncClientError::api(status.as_u16(), error.error));
        }
        Err(SyncClientError::api(
            status.as_u16(),
            format!("Request failed: {}", body),
        ))
    }

    /// `action=test`
    pub async fn test(&self) -> Result<TestResponse> {
        let response = self
            .client
            .get(self.action_url("test", None))
            .headers(self.headers()?)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `action=load` for one user. A `success: false` body is returned as-is.
    pub async fn load(&self, user: &str) -> Result<LoadResponse> {
        let response = self
            .client
            .get(self.action_url("load", Some(user)))
            .headers(self.headers()?)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `action=save`, replacing the user's whole record with `data`.
    pub async fn save(&self, user: &str, data: &Value) -> Result<SaveResponse> {
        let body = SaveRequest {
            action: "save",
            user,
            data,
        };
        let response = self
            .client
            .post(self.action_url("save", Some(user)))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        let response = self
            .client
            .get(self.action_url("stats", None))
            .headers(self.headers()?)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Raw bytes of the whole stored document.
    pub async fn download_backup(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.action_url("backup", None))
            .headers(self.headers()?)
            .send()
            .await?;
        Self::parse_binary_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{start_mock_server, MockOutcome};
    use serde_json::json;

    #[test]
    fn action_url_encodes_user_and_respects_existing_query() {
        let client = SyncApiClient::new("http://host/api/", "k").unwrap();
        assert_eq!(
            client.action_url("load", Some("anna maria")),
            "http://host/api?action=load&user=anna%20maria"
        );

        let client = SyncApiClient::new("http://host/index.php?route=sync", "k").unwrap();
        assert_eq!(
            client.action_url("test", None),
            "http://host/index.php?route=sync&action=test"
        );
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let err = SyncApiClient::new("  ", "k").unwrap_err();
        assert!(matches!(err, SyncClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn save_sends_key_header_and_body() {
        let (base_url, captured, server) = start_mock_server(vec![MockOutcome::json(
            200,
            json!({"success": true, "message": "data saved", "lastUpdate": "2024-01-01 00:00:00"}),
        )])
        .await;

        let client = SyncApiClient::new(&base_url, "secret").unwrap();
        let response = client.save("default", &json!({"Panca": {}})).await.unwrap();
        assert!(response.success);
        assert_eq!(response.last_update.as_deref(), Some("2024-01-01 00:00:00"));

        let requests = captured.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].target, "/api?action=save&user=default");
        assert_eq!(requests[0].api_key.as_deref(), Some("secret"));
        let body: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["data"], json!({"Panca": {}}));
        assert_eq!(body["user"], "default");
        server.abort();
    }

    #[tokio::test]
    async fn error_envelope_becomes_api_error() {
        let (base_url, _captured, server) = start_mock_server(vec![MockOutcome::json(
            401,
            json!({"success": false, "error": "invalid api key"}),
        )])
        .await;

        let client = SyncApiClient::new(&base_url, "wrong").unwrap();
        let err = client.test().await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("invalid api key"));
        server.abort();
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let (base_url, _captured, server) =
            start_mock_server(vec![MockOutcome::raw(200, "<html>oops</html>")]).await;

        let client = SyncApiClient::new(&base_url, "k").unwrap();
        assert!(client.stats().await.is_err());
        server.abort();
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let (base_url, _captured, server) = start_mock_server(vec![MockOutcome::json(
            200,
            json!({"success": true}),
        )
        .delayed(500)])
        .await;

        let client =
            SyncApiClient::with_timeout(&base_url, "k", Duration::from_millis(50)).unwrap();
        let err = client.test().await.unwrap_err();
        assert!(err.is_timeout());
        server.abort();
    }

    #[tokio::test]
    async fn backup_returns_raw_bytes() {
        let (base_url, _captured, server) =
            start_mock_server(vec![MockOutcome::raw(200, "{\n  \"users\": {}\n}")]).await;

        let client = SyncApiClient::new(&base_url, "k").unwrap();
        let bytes = client.download_backup().await.unwrap();
        assert_eq!(bytes, b"{\n  \"users\": {}\n}");
        server.abort();
    }
}
