use std::env;
use std::path::PathBuf;

use crate::identity::DEFAULT_USER_ID_HEADER;
use crate::rtc::RtcCredentials;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: String,
    pub user_id_header: String,
    /// JSON array of sessions to seed the in-memory directory with.
    pub sessions_file: Option<PathBuf>,
    pub cors_origin: Option<String>,
    pub rtc: Option<RtcCredentials>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| {
            var(key).unwrap_or_else(|| {
                log::info!("{} not set, using default: {}", key, default);
                default.to_owned()
            })
        };

        let rtc = match (var("AGORA_APP_ID"), var("AGORA_APP_CERTIFICATE")) {
            (Some(app_id), Some(app_certificate)) => Some(RtcCredentials {
                app_id,
                app_certificate,
            }),
            _ => {
                log::warn!("Agora credentials not configured, video tokens will be refused");
                None
            }
        };

        Self {
            bind_addr: or_default("BIND_ADDR", DEFAULT_BIND_ADDR),
            user_id_header: or_default("USER_ID_HEADER", DEFAULT_USER_ID_HEADER).to_lowercase(),
            sessions_file: var("SESSIONS_FILE").map(PathBuf::from),
            cors_origin: var("CORS_ORIGIN"),
            rtc,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
