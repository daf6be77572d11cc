//! Client-side sync vocabulary: notification severities, outcomes and triggers.

use serde::{Deserialize, Serialize};

/// Severity attached to a status notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSeverity {
    Success,
    Info,
    Warning,
    Error,
}

impl SyncSeverity {
    /// Only success banners go away by themselves; everything else stays until replaced.
    pub fn auto_dismiss(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Result of a client sync operation. Client operations never return errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed,
    Failed,
    /// Not attempted: another operation was in flight, or a periodic push found the session offline.
    Skipped,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Completed
        } else {
            Self::Failed
        }
    }
}

/// Trigger source for sync operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCycleTrigger {
    Startup,
    Manual,
    Periodic,
    LocalMutation,
    NetworkOnline,
}

impl SyncCycleTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Manual => "manual",
            Self::Periodic => "periodic",
            Self::LocalMutation => "local_mutation",
            Self::NetworkOnline => "network_online",
        }
    }
}
