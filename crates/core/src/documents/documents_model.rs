//! Document and per-user record models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// User id used when a request does not name one.
pub const DEFAULT_USER_ID: &str = "default";

/// Exercise keys seeded into a brand-new document.
pub const DEFAULT_EXERCISES: [&str; 4] = ["Panca", "Stacco", "Squat", "Military Press"];

/// Format of `lastUpdate` and other user-facing timestamps (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// One user's synced state. `data` is never interpreted by the sync layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub last_update: String,
    pub data: Value,
}

impl UserRecord {
    pub fn new(data: Value, at: DateTime<Utc>) -> Self {
        Self {
            last_update: format_timestamp(at),
            data,
        }
    }
}

/// The whole persisted state: every user's record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
}

impl Document {
    /// Document written the first time the store is read and nothing exists yet.
    pub fn seeded(at: DateTime<Utc>) -> Self {
        let exercises = DEFAULT_EXERCISES
            .iter()
            .map(|name| ((*name).to_string(), empty_exercise()))
            .collect::<serde_json::Map<String, Value>>();

        let mut users = BTreeMap::new();
        users.insert(
            DEFAULT_USER_ID.to_string(),
            UserRecord::new(Value::Object(exercises), at),
        );
        Self { users }
    }

    pub fn user(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.get(user_id)
    }

    /// Replace a user's entire record. There are no partial field updates.
    pub fn replace_user(&mut self, user_id: &str, record: UserRecord) {
        self.users.insert(user_id.to_string(), record);
    }
}

fn empty_exercise() -> Value {
    json!({
        "maxTests": [],
        "sessions": [],
        "notes": "",
        "complementary": [],
        "videoData": null,
    })
}
