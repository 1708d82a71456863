use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use system::{SyncError, SyncResult, Timestamp, TokenRequest, TokenSigner};

const VERSION: &str = "007";
const SERVICE_RTC: u16 = 1;
// join channel, publish audio, publish video, publish data
const PUBLISHER_PRIVILEGES: [u16; 4] = [1, 2, 3, 4];
const MAX_SALT: u32 = 99_999_999;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq)]
pub struct RtcCredentials {
    pub app_id: String,
    pub app_certificate: String,
}

impl RtcCredentials {
    fn is_well_formed(&self) -> bool {
        let is_key = |s: &str| s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit());
        is_key(&self.app_id) && is_key(&self.app_certificate)
    }
}

/// Mints version 007 RTC access tokens granting publisher privileges on one
/// channel for one uid.
///
/// Layout, all integers little-endian and byte strings prefixed with a `u16`
/// length: `"007" + base64(zlib(signature, app_id, issued_at, expire, salt,
/// services))`. The signature is HMAC-SHA256 over everything after it, keyed
/// by the certificate chained through `issued_at` and `salt`.
pub struct CredentialSigner {
    credentials: RtcCredentials,
}

struct Grant<'a> {
    channel: &'a str,
    uid: u64,
    issued_at: u32,
    expire: u32,
    salt: u32,
}

impl CredentialSigner {
    pub fn new(credentials: RtcCredentials) -> SyncResult<Self> {
        if !credentials.is_well_formed() {
            return Err(SyncError::internal(
                "AGORA_APP_ID and AGORA_APP_CERTIFICATE must be 32 hex characters",
            ));
        }
        Ok(Self { credentials })
    }

    fn build(&self, grant: &Grant) -> SyncResult<String> {
        let mut info = Vec::new();
        put_bytes(&mut info, self.credentials.app_id.as_bytes())?;
        put_u32(&mut info, grant.issued_at);
        put_u32(&mut info, grant.expire);
        put_u32(&mut info, grant.salt);
        put_u16(&mut info, 1);

        put_u16(&mut info, SERVICE_RTC);
        put_u16(&mut info, PUBLISHER_PRIVILEGES.len() as u16);
        for privilege in PUBLISHER_PRIVILEGES {
            put_u16(&mut info, privilege);
            put_u32(&mut info, grant.expire);
        }
        put_bytes(&mut info, grant.channel.as_bytes())?;
        let account = match grant.uid {
            0 => String::new(),
            uid => uid.to_string(),
        };
        put_bytes(&mut info, account.as_bytes())?;

        let signing = hmac(
            &grant.issued_at.to_le_bytes(),
            self.credentials.app_certificate.as_bytes(),
        )?;
        let signing = hmac(&grant.salt.to_le_bytes(), &signing)?;
        let signature = hmac(&signing, &info)?;

        let mut content = Vec::with_capacity(info.len() + signature.len() + 2);
        put_bytes(&mut content, &signature)?;
        content.extend_from_slice(&info);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&content)
            .map_err(|e| SyncError::internal(format!("token compression failed: {}", e)))?;
        let compressed = encoder
            .finish()
            .map_err(|e| SyncError::internal(format!("token compression failed: {}", e)))?;
        Ok(format!("{}{}", VERSION, STANDARD.encode(compressed)))
    }
}

impl TokenSigner for CredentialSigner {
    fn sign(&self, request: &TokenRequest) -> SyncResult<String> {
        let lifetime = (request.expires_at - request.issued_at).num_seconds();
        let expire = u32::try_from(lifetime)
            .map_err(|_| SyncError::internal(format!("token lifetime {}s out of range", lifetime)))?;
        self.build(&Grant {
            channel: &request.channel,
            uid: request.uid,
            issued_at: epoch_secs(request.issued_at)?,
            expire,
            salt: rand::thread_rng().gen_range(1..=MAX_SALT),
        })
    }
}

fn epoch_secs(at: Timestamp) -> SyncResult<u32> {
    u32::try_from(at.timestamp())
        .map_err(|_| SyncError::internal(format!("token issue time {} out of range", at)))
}

fn hmac(key: &[u8], message: &[u8]) -> SyncResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| SyncError::internal(format!("hmac key rejected: {}", e)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> SyncResult<()> {
    let len = u16::try_from(bytes.len())
        .map_err(|_| SyncError::internal("token field longer than 65535 bytes"))?;
    put_u16(buf, len);
    buf.extend_from_slice(bytes);
    Ok(())
}
