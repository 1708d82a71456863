use std::sync::Arc;

use crate::chat::{ChatChannel, ChatMessage};
use crate::clock::{Clock, SystemClock};
use crate::error::{SyncError, SyncResult};
use crate::event_log::{EventStore, MemoryEventLog};
use crate::message::{PostMessage, RecordAction, RequestToken, SinceQuery};
use crate::session::{Session, SessionAuthority};
use crate::token::{TokenGrant, TokenSigner, VideoTokenService};
use crate::types::{CHAT_RETENTION, WHITEBOARD_RETENTION};
use crate::whiteboard::{ActionDraft, DrawingAction, WhiteboardChannel};

/// Request handling for a live session's chat, whiteboard and video tokens.
///
/// Every operation validates its input first, then resolves the session
/// (`NotFound` when unknown), then checks the caller is a participant.
pub struct SessionSync {
    authority: Arc<dyn SessionAuthority>,
    chat: ChatChannel,
    whiteboard: WhiteboardChannel,
    tokens: VideoTokenService,
}

impl SessionSync {
    pub fn new(authority: Arc<dyn SessionAuthority>, signer: Arc<dyn TokenSigner>) -> Self {
        Self::with_clock(authority, signer, Arc::new(SystemClock))
    }

    pub fn with_clock(
        authority: Arc<dyn SessionAuthority>,
        signer: Arc<dyn TokenSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authority,
            chat: ChatChannel::with_store(MemoryEventLog::with_clock(
                CHAT_RETENTION,
                clock.clone(),
            )),
            whiteboard: WhiteboardChannel::with_store(MemoryEventLog::with_clock(
                WHITEBOARD_RETENTION,
                clock.clone(),
            )),
            tokens: VideoTokenService::with_clock(signer, clock),
        }
    }

    pub fn chat(&self) -> &ChatChannel {
        &self.chat
    }

    pub fn whiteboard(&self) -> &WhiteboardChannel {
        &self.whiteboard
    }

    pub async fn session(&self, session_id: &str) -> SyncResult<Session> {
        match self.authority.find_session(session_id).await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(SyncError::session_not_found(session_id)),
            Err(e) => {
                log::error!("Session lookup for {} failed: {}", session_id, e);
                Err(e)
            }
        }
    }

    pub async fn post_message(
        &self,
        session_id: &str,
        caller: &str,
        body: PostMessage,
    ) -> SyncResult<ChatMessage> {
        let content = body.message.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(SyncError::validation("Message cannot be empty"));
        }
        let session = self.session(session_id).await?;
        self.chat.post_message(&session, caller, &content)
    }

    pub async fn list_messages(
        &self,
        session_id: &str,
        caller: &str,
        query: &SinceQuery,
    ) -> SyncResult<Vec<ChatMessage>> {
        let since = query.cursor()?;
        let session = self.session(session_id).await?;
        self.chat.list_messages(&session, caller, since)
    }

    pub async fn record_action(
        &self,
        session_id: &str,
        caller: &str,
        body: RecordAction,
    ) -> SyncResult<DrawingAction> {
        let draft = ActionDraft::parse(body.kind.as_deref(), body.data)?;
        let session = self.session(session_id).await?;
        self.whiteboard.record(&session, caller, draft)
    }

    pub async fn list_actions(
        &self,
        session_id: &str,
        caller: &str,
        query: &SinceQuery,
    ) -> SyncResult<Vec<DrawingAction>> {
        let since = query.cursor()?;
        let session = self.session(session_id).await?;
        self.whiteboard.list_actions(&session, caller, since)
    }

    pub async fn issue_token(
        &self,
        session_id: &str,
        caller: &str,
        body: RequestToken,
    ) -> SyncResult<TokenGrant> {
        let role = VideoTokenService::parse_role(body.role.as_deref())?;
        let session = self.session(session_id).await?;
        self.tokens.issue(&session, caller, role)
    }

    /// Drops both logs of a session. Nothing calls this automatically; logs
    /// outlive the session until the owner of the session lifecycle does.
    /// Events appended afterwards are still stamped after everything purged.
    pub fn purge_session(&self, session_id: &str) -> (usize, usize) {
        let purged = (
            self.chat.store().purge(session_id),
            self.whiteboard.store().purge(session_id),
        );
        log::info!(
            "Purged session {}: {} messages, {} drawing actions",
            session_id,
            purged.0,
            purged.1
        );
        purged
    }
}
