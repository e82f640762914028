//! Per-user fallback record as persisted under `users/{id}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stored cooldown state for one user.
///
/// Every field defaults when absent so partially written or legacy records
/// decode cleanly. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFallbackRecord {
    /// Last escalation, Unix milliseconds (UTC). 0 = never escalated.
    #[serde(deserialize_with = "null_as_zero")]
    pub last_fallback_time: i64,
    /// Civil-time ISO string of the last write. Informational
    #[serde(
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<String>,
    /// Copy of the key. Informational
    #[serde(
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
}

impl UserFallbackRecord {
    /// Decode a raw store value. `null` means no record.
    pub fn from_value(value: Value) -> Result<Option<Self>, serde_json::Error> {
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some)
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

// Informational fields never fail a decode; a wrongly typed value reads as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Fields written on escalation. Merged into the existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackUpdate {
    pub last_fallback_time: i64,
    pub last_updated: String,
    pub user_id: String,
}

impl FallbackUpdate {
    /// Render as the partial-field map handed to [`FallbackStore::update`].
    ///
    /// [`FallbackStore::update`]: crate::store::FallbackStore::update
    pub fn into_fields(self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(serde::ser::Error::custom(format!(
                "expected object, got {other}"
            ))),
        }
    }
}
