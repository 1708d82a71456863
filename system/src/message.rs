use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::types::{parse_since, Timestamp};
use crate::whiteboard::StrokeInput;

/// `POST …/messages`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostMessage {
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST …/whiteboard`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordAction {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<StrokeInput>,
}

/// `POST …/token`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestToken {
    #[serde(default)]
    pub role: Option<String>,
}

/// `GET …?since=`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinceQuery {
    #[serde(default)]
    pub since: Option<String>,
}

impl SinceQuery {
    pub fn new(since: impl Into<String>) -> Self {
        Self {
            since: Some(since.into()),
        }
    }

    /// An absent or blank cursor means "everything".
    pub fn cursor(&self) -> SyncResult<Option<Timestamp>> {
        match self.since.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_since(raw)
                .map(Some)
                .ok_or_else(|| SyncError::validation("since must be an ISO 8601 timestamp")),
        }
    }
}
