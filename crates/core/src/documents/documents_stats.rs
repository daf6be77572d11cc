//! Per-user summary statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;

/// Name of the payload sub-collection counted by [`compute_stats`].
pub const SESSIONS_KEY: &str = "sessions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_sessions: usize,
    pub last_update: String,
}

/// Count recorded sessions per user.
///
/// Only payload entries that are objects carrying a `sessions` array contribute;
/// everything else in the payload is ignored.
pub fn compute_stats(document: &Document) -> BTreeMap<String, UserStats> {
    document
        .users
        .iter()
        .map(|(user_id, record)| {
            (
                user_id.clone(),
                UserStats {
                    total_sessions: count_sessions(&record.data),
                    last_update: record.last_update.clone(),
                },
            )
        })
        .collect()
}

fn count_sessions(payload: &Value) -> usize {
    let Some(entries) = payload.as_object() else {
        return 0;
    };
    entries
        .values()
        .filter_map(|entry| entry.get(SESSIONS_KEY))
        .filter_map(Value::as_array)
        .map(Vec::len)
        .sum()
}
