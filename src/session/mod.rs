//! Session issuance.
//!
//! An issuance turns an already-authenticated [`Identity`] into a
//! [`SessionPair`]: a short-lived access token and a longer-lived refresh
//! token, each bound to its own server-side record holding the same identity
//! snapshot.
//!
//! Records are write-once. Re-issuing writes a brand-new pair; nothing updates
//! an existing record. A record disappears when its TTL elapses or when it is
//! revoked.

pub mod id;
mod issuer;

pub use self::issuer::SessionIssuer;

use crate::{store::StoreError, token};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity attributes supplied by the credential-verification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
}

impl Identity {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Presence check only; format validation belongs upstream.
    ///
    /// # Errors
    /// Returns [`Error::InvalidIdentity`] naming the first blank field.
    pub fn validate(&self) -> Result<(), Error> {
        for (field, value) in [
            ("id", &self.id),
            ("username", &self.username),
            ("email", &self.email),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidIdentity(field));
            }
        }
        Ok(())
    }
}

/// Result of one issuance.
#[derive(Clone, Serialize)]
pub struct SessionPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_session_id: String,
    pub refresh_session_id: String,
    /// Unix seconds.
    pub access_expires_at: i64,
    /// Unix seconds.
    pub refresh_expires_at: i64,
}

impl std::fmt::Debug for SessionPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPair")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("access_session_id", &"***")
            .field("refresh_session_id", &"***")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid identity: {0} is missing")]
    InvalidIdentity(&'static str),
    #[error("failed to sign session token")]
    SigningFailed(#[source] token::Error),
    #[error("failed to encode session record")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write session record")]
    StoreWriteFailed(#[source] StoreError),
    #[error("session store unavailable")]
    StoreUnavailable(#[source] StoreError),
    #[error("invalid session token")]
    InvalidToken(#[source] token::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("failed to read session record")]
    StoreReadFailed(#[source] StoreError),
    #[error("failed to delete session records")]
    StoreDeleteFailed(#[source] StoreError),
    #[error("corrupt session record")]
    CorruptRecord(#[source] serde_json::Error),
    #[error("refresh token consumed but no new session was issued")]
    RotationFailed(#[source] Box<Error>),
}

impl Error {
    /// Whether repeating the whole call may succeed.
    ///
    /// Identifiers are generated fresh on every issuance, so retrying after a
    /// store failure never collides with the failed attempt's records. A
    /// rejected TTL or a spent refresh token fails the same way every time.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreWriteFailed(StoreError::InvalidTtl) => false,
            Self::StoreWriteFailed(_)
            | Self::StoreUnavailable(_)
            | Self::StoreReadFailed(_)
            | Self::StoreDeleteFailed(_) => true,
            _ => false,
        }
    }

    fn on_write(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => Self::StoreUnavailable(err),
            _ => Self::StoreWriteFailed(err),
        }
    }

    fn on_read(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::SessionNotFound,
            StoreError::Unavailable(_) => Self::StoreUnavailable(err),
            _ => Self::StoreReadFailed(err),
        }
    }

    fn on_delete(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => Self::StoreUnavailable(err),
            _ => Self::StoreDeleteFailed(err),
        }
    }
}
