//! Issuer configuration.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_ACCESS_TTL_SECONDS: u64 = 15 * 60;
pub const DEFAULT_REFRESH_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379/0";
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_ACCESS_SESSION_ID_LEN: usize = 30;
pub const DEFAULT_REFRESH_SESSION_ID_LEN: usize = 60;
/// Shortest identifier accepted; 24 symbols over a 65-symbol alphabet is ~144 bits.
pub const MIN_SESSION_ID_LEN: usize = 24;

const STORE_SCHEMES: [&str; 3] = ["redis", "rediss", "memory"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} secret must not be empty")]
    EmptySecret(&'static str),
    #[error("access and refresh secrets must differ")]
    SharedSecret,
    #[error("{0} ttl must be greater than zero")]
    ZeroTtl(&'static str),
    #[error("{0} ttl must be a whole number of seconds")]
    FractionalTtl(&'static str),
    #[error("refresh ttl ({refresh:?}) must be longer than access ttl ({access:?})")]
    TtlOrder { access: Duration, refresh: Duration },
    #[error("{kind} session id length {len} is below the minimum of {min}", min = MIN_SESSION_ID_LEN)]
    SessionIdTooShort { kind: &'static str, len: usize },
    #[error("invalid store url: {0}")]
    InvalidStoreUrl(String),
    #[error("unsupported store url scheme: {0}")]
    UnsupportedStoreScheme(String),
    #[error("store timeout must be greater than zero")]
    ZeroStoreTimeout,
}

#[derive(Clone)]
pub struct IssuerConfig {
    access_secret: SecretString,
    refresh_secret: SecretString,
    access_ttl: Duration,
    refresh_ttl: Duration,
    store_url: String,
    store_timeout: Duration,
    access_session_id_len: usize,
    refresh_session_id_len: usize,
}

impl IssuerConfig {
    #[must_use]
    pub fn new(access_secret: SecretString, refresh_secret: SecretString) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_SECONDS),
            refresh_ttl: Duration::from_secs(DEFAULT_REFRESH_TTL_SECONDS),
            store_url: DEFAULT_STORE_URL.to_string(),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            access_session_id_len: DEFAULT_ACCESS_SESSION_ID_LEN,
            refresh_session_id_len: DEFAULT_REFRESH_SESSION_ID_LEN,
        }
    }

    #[must_use]
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_store_url(mut self, url: String) -> Self {
        self.store_url = url;
        self
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_session_id_lengths(mut self, access: usize, refresh: usize) -> Self {
        self.access_session_id_len = access;
        self.refresh_session_id_len = refresh;
        self
    }

    #[must_use]
    pub fn access_secret(&self) -> &SecretString {
        &self.access_secret
    }

    #[must_use]
    pub fn refresh_secret(&self) -> &SecretString {
        &self.refresh_secret
    }

    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    #[must_use]
    pub fn store_url(&self) -> &str {
        &self.store_url
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    #[must_use]
    pub fn access_session_id_len(&self) -> usize {
        self.access_session_id_len
    }

    #[must_use]
    pub fn refresh_session_id_len(&self) -> usize {
        self.refresh_session_id_len
    }

    /// Check every setting once, before any issuer is built from it.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let access = self.access_secret.expose_secret();
        let refresh = self.refresh_secret.expose_secret();
        if access.is_empty() {
            return Err(ConfigError::EmptySecret("access"));
        }
        if refresh.is_empty() {
            return Err(ConfigError::EmptySecret("refresh"));
        }
        if access == refresh {
            return Err(ConfigError::SharedSecret);
        }

        // Token expiries are unix seconds.
        for (kind, ttl) in [("access", self.access_ttl), ("refresh", self.refresh_ttl)] {
            if ttl.is_zero() {
                return Err(ConfigError::ZeroTtl(kind));
            }
            if ttl.subsec_nanos() != 0 {
                return Err(ConfigError::FractionalTtl(kind));
            }
        }
        if self.refresh_ttl.as_secs() <= self.access_ttl.as_secs() {
            return Err(ConfigError::TtlOrder {
                access: self.access_ttl,
                refresh: self.refresh_ttl,
            });
        }

        for (kind, len) in [
            ("access", self.access_session_id_len),
            ("refresh", self.refresh_session_id_len),
        ] {
            if len < MIN_SESSION_ID_LEN {
                return Err(ConfigError::SessionIdTooShort { kind, len });
            }
        }

        let url =
            Url::parse(&self.store_url).map_err(|e| ConfigError::InvalidStoreUrl(e.to_string()))?;
        if !STORE_SCHEMES.contains(&url.scheme()) {
            return Err(ConfigError::UnsupportedStoreScheme(url.scheme().to_string()));
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::ZeroStoreTimeout);
        }

        Ok(())
    }
}

impl std::fmt::Debug for IssuerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerConfig")
            .field("access_secret", &"***")
            .field("refresh_secret", &"***")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("store_url", &self.store_url)
            .field("store_timeout", &self.store_timeout)
            .field("access_session_id_len", &self.access_session_id_len)
            .field("refresh_session_id_len", &self.refresh_session_id_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> IssuerConfig {
        IssuerConfig::new(SecretString::from("access"), SecretString::from("refresh"))
    }

    #[test]
    fn defaults_are_valid() {
        let config = base();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.access_ttl(), Duration::from_secs(900));
        assert_eq!(config.refresh_ttl(), Duration::from_secs(604_800));
        assert_eq!(config.store_url(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn rejects_empty_or_shared_secrets() {
        let empty = IssuerConfig::new(SecretString::from(""), SecretString::from("refresh"));
        assert_eq!(empty.validate(), Err(ConfigError::EmptySecret("access")));

        let empty = IssuerConfig::new(SecretString::from("access"), SecretString::from(""));
        assert_eq!(empty.validate(), Err(ConfigError::EmptySecret("refresh")));

        let shared = IssuerConfig::new(SecretString::from("same"), SecretString::from("same"));
        assert_eq!(shared.validate(), Err(ConfigError::SharedSecret));
    }

    #[test]
    fn refresh_ttl_must_exceed_access_ttl() {
        let config = base()
            .with_access_ttl(Duration::from_secs(600))
            .with_refresh_ttl(Duration::from_secs(600));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TtlOrder { .. })
        ));

        let config = base().with_access_ttl(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTtl("access")));
    }

    #[test]
    fn ttls_are_whole_seconds() {
        let config = base()
            .with_access_ttl(Duration::from_millis(1200))
            .with_refresh_ttl(Duration::from_millis(1800));
        assert_eq!(config.validate(), Err(ConfigError::FractionalTtl("access")));

        let config = base().with_access_ttl(Duration::from_millis(500));
        assert_eq!(config.validate(), Err(ConfigError::FractionalTtl("access")));

        let config = base().with_refresh_ttl(Duration::from_millis(604_800_500));
        assert_eq!(config.validate(), Err(ConfigError::FractionalTtl("refresh")));

        let config = base()
            .with_access_ttl(Duration::from_secs(1))
            .with_refresh_ttl(Duration::from_secs(2));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn session_ids_have_a_floor() {
        let config = base().with_session_id_lengths(23, 60);
        assert_eq!(
            config.validate(),
            Err(ConfigError::SessionIdTooShort {
                kind: "access",
                len: 23
            })
        );
        assert_eq!(config.with_session_id_lengths(24, 24).validate(), Ok(()));
    }

    #[test]
    fn store_url_is_checked() {
        let config = base().with_store_url("mysql://localhost".to_string());
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnsupportedStoreScheme("mysql".to_string()))
        );

        let config = base().with_store_url("::".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStoreUrl(_))
        ));

        let config = base().with_store_url("memory://".to_string());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", base());
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("\"access\""));
    }
}
