use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong, independent of any transport.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or empty input. Caller bug, never retried.
    Validation,
    /// No verified identity on the request.
    Unauthenticated,
    /// Caller is not one of the session's two participants.
    Authorization,
    NotFound,
    /// Anything unmapped, e.g. the session store being unreachable.
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Authorization => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Message safe to show to a client for this kind.
    pub fn public_message(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Invalid request",
            ErrorKind::Unauthenticated => "Not authenticated",
            ErrorKind::Authorization => "Not authorized",
            ErrorKind::NotFound => "Not found",
            ErrorKind::Internal => "Something went wrong",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind:?}: {message}")]
pub struct SyncError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SyncError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(
            ErrorKind::Unauthenticated,
            ErrorKind::Unauthenticated.public_message(),
        )
    }

    pub fn not_authorized() -> Self {
        Self::new(
            ErrorKind::Authorization,
            ErrorKind::Authorization.public_message(),
        )
    }

    pub fn session_not_found(session_id: &str) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("session '{}' does not exist", session_id),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Internal details never leave the process.
    pub fn client_message(&self) -> &str {
        match self.kind {
            ErrorKind::Internal => self.kind.public_message(),
            _ => &self.message,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
