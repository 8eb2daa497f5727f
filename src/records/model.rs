//! Record and session value types.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Display format used for modification timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored object as returned by `GET /users/{userId}/records`.
///
/// `id` is the identity key: two records with the same `id` are the same
/// logical record whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_modification_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl Record {
    /// Whether the tag set contains `tag` exactly.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Modification time rendered as `YYYY-MM-DD HH:MM:SS`.
    pub fn formatted_time(&self) -> String {
        self.last_modification_time
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

// The service emits RFC 3339 timestamps, but older records come back
// without an offset; those are UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognised timestamp `{raw}`"))
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Decode `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Authenticated credential pair, immutable for the process lifetime.
///
/// The token is only reachable through [`Session::token`] and
/// [`Session::authorization`]; `Debug` redacts it so it never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
    token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value of the `Authorization` header: `res <userId>:<token>`.
    pub fn authorization(&self) -> String {
        format!("res {}:{}", self.user_id, self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}
