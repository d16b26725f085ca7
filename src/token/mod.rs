//! Access and refresh token signing.
//!
//! Both token kinds are compact HS256 JWTs. They are signed with independent
//! secrets, so a refresh token never verifies as an access token and the other
//! way around.

mod jwt;

pub use jwt::{sign_hs256, verify_hs256, Error, Expiring, TokenHeader, ALGORITHM};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Claims of a short-lived access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub authorized: bool,
    #[serde(rename = "uuid")]
    pub session_id: String,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl AccessClaims {
    #[must_use]
    pub fn new(session_id: impl Into<String>, expires_at: i64) -> Self {
        Self {
            authorized: true,
            session_id: session_id.into(),
            expires_at,
        }
    }
}

impl Expiring for AccessClaims {
    fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

/// Claims of a long-lived refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
    #[serde(rename = "uuid")]
    pub session_id: String,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl RefreshClaims {
    #[must_use]
    pub fn new(session_id: impl Into<String>, expires_at: i64) -> Self {
        Self {
            session_id: session_id.into(),
            expires_at,
        }
    }
}

impl Expiring for RefreshClaims {
    fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

/// Holds the two signing secrets.
#[derive(Clone)]
pub struct TokenSigner {
    access_secret: SecretString,
    refresh_secret: SecretString,
}

impl TokenSigner {
    #[must_use]
    pub fn new(access_secret: SecretString, refresh_secret: SecretString) -> Self {
        Self {
            access_secret,
            refresh_secret,
        }
    }

    /// # Errors
    /// Returns an error if the access secret is empty or the claims cannot be encoded.
    pub fn sign_access(&self, claims: &AccessClaims) -> Result<String, Error> {
        sign_hs256(self.access_secret.expose_secret().as_bytes(), claims)
    }

    /// # Errors
    /// Returns an error if the refresh secret is empty or the claims cannot be encoded.
    pub fn sign_refresh(&self, claims: &RefreshClaims) -> Result<String, Error> {
        sign_hs256(self.refresh_secret.expose_secret().as_bytes(), claims)
    }

    /// Verify an access token against the access secret.
    ///
    /// # Errors
    /// Returns an error if the token is malformed, not signed with the access
    /// secret, expired, or does not carry `authorized: true`.
    pub fn verify_access(&self, token: &str, now_unix_seconds: i64) -> Result<AccessClaims, Error> {
        let claims: AccessClaims = verify_hs256(
            token,
            self.access_secret.expose_secret().as_bytes(),
            now_unix_seconds,
        )?;
        if !claims.authorized {
            return Err(Error::Malformed("access token is not authorized"));
        }
        if claims.session_id.is_empty() {
            return Err(Error::Malformed("empty session id"));
        }
        Ok(claims)
    }

    /// Verify a refresh token against the refresh secret.
    ///
    /// # Errors
    /// Returns an error if the token is malformed, not signed with the refresh
    /// secret, or expired.
    pub fn verify_refresh(
        &self,
        token: &str,
        now_unix_seconds: i64,
    ) -> Result<RefreshClaims, Error> {
        let claims: RefreshClaims = verify_hs256(
            token,
            self.refresh_secret.expose_secret().as_bytes(),
            now_unix_seconds,
        )?;
        if claims.session_id.is_empty() {
            return Err(Error::Malformed("empty session id"));
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("access_secret", &"***")
            .field("refresh_secret", &"***")
            .finish()
    }
}
