use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::event_log::{Event, EventStore, MemoryEventLog};
use crate::session::Session;
use crate::types::{new_event_id, EventId, Timestamp, UserId, CHAT_RETENTION};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: EventId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    #[serde(with = "crate::types::iso_millis")]
    pub timestamp: Timestamp,
}

impl Event for ChatMessage {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn stamped(self, timestamp: Timestamp) -> Self {
        ChatMessage { timestamp, ..self }
    }
}

pub struct ChatChannel<S = MemoryEventLog<ChatMessage>> {
    log: S,
}

impl ChatChannel {
    pub fn new() -> Self {
        Self::with_store(MemoryEventLog::new(CHAT_RETENTION))
    }
}

impl Default for ChatChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventStore<ChatMessage>> ChatChannel<S> {
    pub fn with_store(log: S) -> Self {
        Self { log }
    }

    pub fn store(&self) -> &S {
        &self.log
    }

    pub fn post_message(
        &self,
        session: &Session,
        sender_id: &str,
        raw_content: &str,
    ) -> SyncResult<ChatMessage> {
        let content = raw_content.trim();
        if content.is_empty() {
            return Err(SyncError::validation("Message cannot be empty"));
        }
        let sender_name = session.authorize(sender_id)?;

        let message = self.log.append_with(&session.id, |timestamp| ChatMessage {
            id: new_event_id(),
            sender_id: sender_id.to_owned(),
            sender_name: sender_name.to_owned(),
            content: content.to_owned(),
            timestamp,
        });
        log::debug!("Session {}: message {} from {}", session.id, message.id, sender_id);
        Ok(message)
    }

    pub fn list_messages(
        &self,
        session: &Session,
        caller_id: &str,
        since: Option<Timestamp>,
    ) -> SyncResult<Vec<ChatMessage>> {
        session.authorize(caller_id)?;
        Ok(self.log.list_since(&session.id, since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn session() -> Session {
        Session::new("s-1", ("1", "Alice"), ("2", "Bob"))
    }

    #[test]
    fn it_trims_and_names_the_sender() {
        let chat = ChatChannel::new();
        let msg = chat.post_message(&session(), "2", "  hello there \n").expect("posted");
        assert_eq!(msg.content, "hello there");
        assert_eq!(msg.sender_name, "Bob");
        assert_eq!(msg.sender_id, "2");
    }

    #[test]
    fn it_rejects_blank_messages_without_mutation() {
        let chat = ChatChannel::new();
        let s = session();
        chat.post_message(&s, "1", "first").expect("posted");

        let err = chat.post_message(&s, "1", " \t\n ").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(chat.store().len(&s.id), 1);
    }

    #[test]
    fn it_rejects_outsiders_without_mutation() {
        let chat = ChatChannel::new();
        let s = session();

        let err = chat.post_message(&s, "3", "let me in").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert_eq!(chat.store().len(&s.id), 0);

        let err = chat.list_messages(&s, "3", None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[test]
    fn it_retains_the_most_recent_hundred() {
        let chat = ChatChannel::new();
        let s = session();
        for n in 0..(CHAT_RETENTION + 20) {
            chat.post_message(&s, "1", &format!("m{}", n)).expect("posted");
        }
        let messages = chat.list_messages(&s, "2", None).expect("listed");
        assert_eq!(messages.len(), CHAT_RETENTION);
        assert_eq!(messages[0].content, "m20");
        assert_eq!(messages[CHAT_RETENTION - 1].content, "m119");
    }

    #[test]
    fn it_serializes_with_wire_names() {
        let chat = ChatChannel::new();
        let msg = chat.post_message(&session(), "1", "hi").expect("posted");
        let json = serde_json::to_value(&msg).expect("serializable");
        assert_eq!(json["senderId"], "1");
        assert_eq!(json["senderName"], "Alice");
        assert_eq!(json["content"], "hi");
        let stamp = json["timestamp"].as_str().expect("string");
        assert_eq!(stamp.len(), "2024-05-01T10:00:00.000Z".len());
        assert!(stamp.ends_with('Z'));
    }
}
