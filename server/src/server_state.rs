use std::fs;
use std::sync::Arc;

use system::{
    InMemorySessionDirectory, SessionAuthority, SessionSync, SyncError, SyncResult, TokenSigner,
    UnconfiguredSigner,
};

use crate::config::Config;
use crate::rtc::CredentialSigner;

pub struct ServerState {
    pub sync: SessionSync,
    pub user_id_header: String,
}

impl ServerState {
    pub fn new(sync: SessionSync, user_id_header: impl Into<String>) -> Self {
        Self {
            sync,
            user_id_header: user_id_header.into(),
        }
    }

    pub fn from_config(config: &Config) -> SyncResult<Self> {
        let directory = match &config.sessions_file {
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|e| {
                    SyncError::internal(format!("cannot read {}: {}", path.display(), e))
                })?;
                InMemorySessionDirectory::from_json(&json)?
            }
            None => {
                log::warn!("SESSIONS_FILE not set, starting with no sessions");
                InMemorySessionDirectory::new()
            }
        };
        let authority: Arc<dyn SessionAuthority> = Arc::new(directory);

        let signer: Arc<dyn TokenSigner> = match &config.rtc {
            Some(credentials) => Arc::new(CredentialSigner::new(credentials.clone())?),
            None => Arc::new(UnconfiguredSigner),
        };

        Ok(Self::new(
            SessionSync::new(authority, signer),
            config.user_id_header.clone(),
        ))
    }
}
