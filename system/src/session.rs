use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{SyncError, SyncResult};
use crate::types::{SessionId, UserId};

/// A scheduled tutoring engagement between exactly two participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub participant_one_id: UserId,
    pub participant_one_name: String,
    pub participant_two_id: UserId,
    pub participant_two_name: String,
}

impl Session {
    pub fn new(
        id: impl Into<SessionId>,
        one: (impl Into<UserId>, impl Into<String>),
        two: (impl Into<UserId>, impl Into<String>),
    ) -> Self {
        Self {
            id: id.into(),
            participant_one_id: one.0.into(),
            participant_one_name: one.1.into(),
            participant_two_id: two.0.into(),
            participant_two_name: two.1.into(),
        }
    }

    pub fn participant_name(&self, user_id: &str) -> Option<&str> {
        if user_id == self.participant_one_id {
            Some(&self.participant_one_name)
        } else if user_id == self.participant_two_id {
            Some(&self.participant_two_name)
        } else {
            None
        }
    }

    /// Display name of `user_id`, or `Authorization` for outsiders.
    pub fn authorize(&self, user_id: &str) -> SyncResult<&str> {
        self.participant_name(user_id).ok_or_else(|| {
            log::info!("User {} is not a participant of session {}", user_id, self.id);
            SyncError::not_authorized()
        })
    }
}

/// Resolves a session id to its participants. Backed by whatever document
/// store owns sessions; `Ok(None)` means the session does not exist, `Err`
/// means the store could not answer.
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    async fn find_session(&self, session_id: &str) -> SyncResult<Option<Session>>;
}

#[derive(Default)]
pub struct InMemorySessionDirectory {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sessions(sessions: impl IntoIterator<Item = Session>) -> Self {
        Self {
            sessions: RwLock::new(sessions.into_iter().map(|s| (s.id.clone(), s)).collect()),
        }
    }

    /// Parses a JSON array of sessions.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let sessions: Vec<Session> = serde_json::from_str(json)
            .map_err(|e| SyncError::internal(format!("invalid sessions document: {}", e)))?;
        Ok(Self::from_sessions(sessions))
    }
}

#[async_trait]
impl SessionAuthority for InMemorySessionDirectory {
    async fn find_session(&self, session_id: &str) -> SyncResult<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }
}
