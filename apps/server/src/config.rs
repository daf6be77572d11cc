//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub api_key: String,
    pub allowed_origin: Option<HeaderValue>,
    pub max_body_bytes: usize,
    pub log_json: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field("api_key", &"<redacted>")
            .field("allowed_origin", &self.allowed_origin)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("log_json", &self.log_json)
            .finish()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = var("LIFTSYNC_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "LIFTSYNC_BIND",
            value: bind_raw.clone(),
        })?;

        let data_dir = PathBuf::from(var("LIFTSYNC_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let api_key = var("LIFTSYNC_API_KEY").ok_or(ConfigError::Missing("LIFTSYNC_API_KEY"))?;

        let allowed_origin = match var("LIFTSYNC_ALLOWED_ORIGIN") {
            Some(origin) => Some(HeaderValue::from_str(&origin).map_err(|_| {
                ConfigError::Invalid {
                    name: "LIFTSYNC_ALLOWED_ORIGIN",
                    value: origin.clone(),
                }
            })?),
            None => None,
        };

        let max_body_bytes = match var("LIFTSYNC_MAX_BODY_BYTES") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "LIFTSYNC_MAX_BODY_BYTES",
                value: raw.clone(),
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let log_json = var("LIFTSYNC_LOG_JSON")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false);

        Ok(Self {
            bind_addr,
            data_dir,
            api_key,
            allowed_origin,
            max_body_bytes,
            log_json,
        })
    }
}
