use chrono::{DateTime, Utc};

pub type SessionId = String;
pub type UserId = String;
pub type EventId = String;
pub type Timestamp = DateTime<Utc>;

pub const CHAT_RETENTION: usize = 100;
pub const WHITEBOARD_RETENTION: usize = 1000;

pub fn new_event_id() -> EventId {
    uuid::Uuid::new_v4().to_string()
}

/// Parses the `since` cursor polling clients send back (RFC 3339, e.g.
/// `Date.prototype.toISOString()` output). A positive offset whose `+` was
/// not percent-encoded reaches us as a space and is read as `+` again.
pub fn parse_since(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|e| match raw.rsplit_once(' ') {
            Some((local, offset)) => DateTime::parse_from_rfc3339(&format!("{}+{}", local, offset)),
            None => Err(e),
        })
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// `2024-05-01T10:00:00.123Z`, the shape browsers produce for `toISOString`.
pub mod iso_millis {
    use super::{parse_since, Timestamp};
    use chrono::SecondsFormat;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_since(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }
}
