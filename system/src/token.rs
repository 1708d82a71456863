use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::{SyncError, SyncResult};
use crate::session::Session;
use crate::types::Timestamp;

pub const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    Host,
    Audience,
}

impl TokenRole {
    fn uid_suffix(&self) -> u64 {
        match self {
            TokenRole::Host => 1,
            TokenRole::Audience => 2,
        }
    }
}

impl FromStr for TokenRole {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(TokenRole::Host),
            "audience" => Ok(TokenRole::Audience),
            _ => Err(SyncError::validation(
                "Role must be either 'host' or 'audience'",
            )),
        }
    }
}

/// `user_id * 10 + 1` for hosts, `+ 2` for the audience, so the two
/// participants never share an RTC uid within a channel.
pub fn derive_uid(user_id: &str, role: TokenRole) -> SyncResult<u64> {
    let base: u64 = user_id
        .trim()
        .parse()
        .map_err(|_| SyncError::validation("User id must be numeric for video calls"))?;
    base.checked_mul(10)
        .and_then(|v| v.checked_add(role.uid_suffix()))
        .ok_or_else(|| SyncError::validation("User id is out of range for video calls"))
}

/// Everything the RTC provider needs to mint a token. Both participants
/// publish, the role only shapes the uid.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRequest {
    pub channel: String,
    pub uid: u64,
    pub role: TokenRole,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

pub trait TokenSigner: Send + Sync {
    fn sign(&self, request: &TokenRequest) -> SyncResult<String>;
}

/// Used when no provider credentials are configured.
pub struct UnconfiguredSigner;

impl TokenSigner for UnconfiguredSigner {
    fn sign(&self, _: &TokenRequest) -> SyncResult<String> {
        Err(SyncError::validation("Agora credentials not configured"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub uid: u64,
    pub role: TokenRole,
}

pub struct VideoTokenService {
    signer: Arc<dyn TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl VideoTokenService {
    pub fn new(signer: Arc<dyn TokenSigner>) -> Self {
        Self::with_clock(signer, Arc::new(SystemClock))
    }

    pub fn with_clock(signer: Arc<dyn TokenSigner>, clock: Arc<dyn Clock>) -> Self {
        Self { signer, clock }
    }

    pub fn parse_role(role: Option<&str>) -> SyncResult<TokenRole> {
        role.ok_or_else(|| SyncError::validation("Role must be either 'host' or 'audience'"))?
            .parse()
    }

    pub fn issue(&self, session: &Session, user_id: &str, role: TokenRole) -> SyncResult<TokenGrant> {
        session.authorize(user_id)?;
        let uid = derive_uid(user_id, role)?;
        let issued_at = self.clock.now();
        let request = TokenRequest {
            channel: session.id.clone(),
            uid,
            role,
            issued_at,
            expires_at: issued_at + chrono::Duration::seconds(TOKEN_LIFETIME_SECS),
        };
        let token = self.signer.sign(&request)?;
        log::info!(
            "Issued {:?} video token for user {} in session {}",
            role,
            user_id,
            session.id
        );
        Ok(TokenGrant { token, uid, role })
    }
}
