use super::{id, Error, Identity, SessionPair};
use crate::{
    clock::{Clock, SystemClock},
    config::{ConfigError, IssuerConfig},
    store::SessionStore,
    token::{AccessClaims, RefreshClaims, TokenSigner},
};
use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};
use tracing::{debug, instrument, warn};

/// Issues, resolves, rotates and revokes dual-token sessions.
///
/// Cheap to share behind an `Arc`; all state is either immutable or owned by
/// the injected store.
pub struct SessionIssuer {
    signer: TokenSigner,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    access_session_id_len: usize,
    refresh_session_id_len: usize,
}

impl SessionIssuer {
    /// # Errors
    /// Returns an error if `config` does not validate.
    pub fn new(config: &IssuerConfig, store: Arc<dyn SessionStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            signer: TokenSigner::new(
                config.access_secret().clone(),
                config.refresh_secret().clone(),
            ),
            store,
            clock: Arc::new(SystemClock),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
            access_session_id_len: config.access_session_id_len(),
            refresh_session_id_len: config.refresh_session_id_len(),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Issue a new access/refresh pair for `identity`.
    ///
    /// Both tokens are signed before anything is written. The access record is
    /// written first; if the refresh write then fails the error is returned
    /// and the access record is left to expire on its own.
    ///
    /// # Errors
    /// - [`Error::InvalidIdentity`] before any side effect,
    /// - [`Error::SigningFailed`] with nothing written,
    /// - [`Error::StoreWriteFailed`] / [`Error::StoreUnavailable`] from either write.
    #[instrument(skip_all, fields(user_id = %identity.id))]
    pub async fn issue_session(&self, identity: &Identity) -> Result<SessionPair, Error> {
        identity.validate()?;

        let now = self.clock.unix_seconds();
        let access_expires_at = expires_at(now, self.access_ttl);
        let refresh_expires_at = expires_at(now, self.refresh_ttl);

        let access_session_id = id::generate(self.access_session_id_len);
        let refresh_session_id = id::generate(self.refresh_session_id_len);

        let access_token = self
            .signer
            .sign_access(&AccessClaims::new(
                access_session_id.clone(),
                access_expires_at,
            ))
            .map_err(Error::SigningFailed)?;
        let refresh_token = self
            .signer
            .sign_refresh(&RefreshClaims::new(
                refresh_session_id.clone(),
                refresh_expires_at,
            ))
            .map_err(Error::SigningFailed)?;

        let snapshot = serde_json::to_string(identity).map_err(Error::Encode)?;

        self.store
            .set(
                &access_session_id,
                &snapshot,
                self.ttl_until(access_expires_at),
            )
            .await
            .map_err(|err| {
                warn!("access session write failed: {err}");
                Error::on_write(err)
            })?;

        self.store
            .set(
                &refresh_session_id,
                &snapshot,
                self.ttl_until(refresh_expires_at),
            )
            .await
            .map_err(|err| {
                warn!("refresh session write failed, access session left to expire: {err}");
                Error::on_write(err)
            })?;

        debug!(access_expires_at, refresh_expires_at, "session issued");

        Ok(SessionPair {
            access_token,
            refresh_token,
            access_session_id,
            refresh_session_id,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Resolve an access token to the identity stored for its session.
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] if the token does not verify against the
    /// access secret and [`Error::SessionNotFound`] if the record has expired
    /// or was revoked.
    #[instrument(skip_all)]
    pub async fn resolve_access(&self, access_token: &str) -> Result<Identity, Error> {
        let claims = self
            .signer
            .verify_access(access_token, self.clock.unix_seconds())
            .map_err(Error::InvalidToken)?;
        self.load(&claims.session_id).await
    }

    /// Exchange a refresh token for a brand-new pair.
    ///
    /// The consumed refresh record is deleted before the new pair is issued,
    /// so a refresh token works at most once.
    ///
    /// # Errors
    /// Returns [`Error::InvalidToken`] or [`Error::SessionNotFound`] for an
    /// unusable refresh token. If issuing the new pair fails after the old
    /// refresh record was consumed, returns [`Error::RotationFailed`]; the
    /// refresh token is spent and the caller has to authenticate again.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<SessionPair, Error> {
        let claims = self
            .signer
            .verify_refresh(refresh_token, self.clock.unix_seconds())
            .map_err(Error::InvalidToken)?;
        let identity = self.load(&claims.session_id).await?;

        // A concurrent refresh with the same token loses here.
        if self.revoke(&[claims.session_id]).await? == 0 {
            return Err(Error::SessionNotFound);
        }

        self.issue_session(&identity).await.map_err(|err| {
            warn!("refresh token consumed but new session not issued: {err}");
            Error::RotationFailed(Box::new(err))
        })
    }

    /// Delete session records, returning how many were live.
    ///
    /// # Errors
    /// Returns an error if the store rejects the delete.
    #[instrument(skip_all, fields(sessions = session_ids.len()))]
    pub async fn revoke(&self, session_ids: &[String]) -> Result<u64, Error> {
        self.store
            .delete(session_ids)
            .await
            .map_err(Error::on_delete)
    }

    async fn load(&self, session_id: &str) -> Result<Identity, Error> {
        let raw = self.store.get(session_id).await.map_err(Error::on_read)?;
        serde_json::from_str(&raw).map_err(Error::CorruptRecord)
    }

    /// Remaining lifetime of a token expiring at `expires_at`, measured now.
    fn ttl_until(&self, expires_at: i64) -> Duration {
        let deadline = UNIX_EPOCH + Duration::from_secs(u64::try_from(expires_at).unwrap_or(0));
        deadline
            .duration_since(self.clock.now())
            .unwrap_or(Duration::ZERO)
    }
}

fn expires_at(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("signer", &self.signer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("access_session_id_len", &self.access_session_id_len)
            .field("refresh_session_id_len", &self.refresh_session_id_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, store::MemoryStore};
    use secrecy::SecretString;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn expires_at_saturates() {
        assert_eq!(expires_at(10, Duration::from_secs(5)), 15);
        assert_eq!(expires_at(i64::MAX - 1, Duration::from_secs(5)), i64::MAX);
    }

    #[test]
    fn ttl_until_tracks_the_clock() -> Result<(), ConfigError> {
        let clock = ManualClock::at_unix(NOW);
        let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
        let config = IssuerConfig::new(SecretString::from("a"), SecretString::from("r"));
        let issuer = SessionIssuer::new(&config, store)?.with_clock(Arc::new(clock.clone()));

        let deadline = i64::try_from(NOW + 900).unwrap_or(i64::MAX);
        assert_eq!(issuer.ttl_until(deadline), Duration::from_secs(900));

        clock.advance(Duration::from_secs(1000));
        assert_eq!(issuer.ttl_until(deadline), Duration::ZERO);
        Ok(())
    }

    #[test]
    fn rejects_invalid_config() {
        let clock = ManualClock::at_unix(NOW);
        let store = Arc::new(MemoryStore::new(Arc::new(clock)));
        let config = IssuerConfig::new(SecretString::from(""), SecretString::from("r"));
        assert!(matches!(
            SessionIssuer::new(&config, store),
            Err(ConfigError::EmptySecret("access"))
        ));
    }
}
