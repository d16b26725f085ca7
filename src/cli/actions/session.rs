//! Session operations behind the CLI subcommands. Each returns the JSON
//! document printed on stdout.

use crate::{
    clock::{Clock, SystemClock},
    config::IssuerConfig,
    session::{Identity, SessionIssuer},
    store,
    token::TokenSigner,
};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

fn issuer(config: &IssuerConfig) -> Result<SessionIssuer> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = store::open(config.store_url(), config.store_timeout(), clock.clone())
        .context("failed to open session store")?;
    debug!("session store ready");

    let issuer = SessionIssuer::new(config, store)
        .context("invalid issuer configuration")?
        .with_clock(clock);

    Ok(issuer)
}

/// # Errors
/// Returns an error if signing or either store write fails.
#[instrument(skip_all)]
pub async fn issue(config: &IssuerConfig, identity: &Identity) -> Result<String> {
    let pair = issuer(config)?
        .issue_session(identity)
        .await
        .context("failed to issue session")?;

    Ok(serde_json::to_string_pretty(&pair)?)
}

/// Check signature and expiry only; the store is not consulted.
///
/// # Errors
/// Returns an error if the token does not verify.
pub fn verify(config: &IssuerConfig, token: &str, refresh: bool) -> Result<String> {
    let signer = TokenSigner::new(
        config.access_secret().clone(),
        config.refresh_secret().clone(),
    );
    let now = SystemClock.unix_seconds();

    let claims = if refresh {
        serde_json::to_value(signer.verify_refresh(token, now).context("invalid refresh token")?)?
    } else {
        serde_json::to_value(signer.verify_access(token, now).context("invalid access token")?)?
    };

    Ok(serde_json::to_string_pretty(&claims)?)
}

/// # Errors
/// Returns an error if the token is invalid or its session is gone.
#[instrument(skip_all)]
pub async fn resolve(config: &IssuerConfig, token: &str) -> Result<String> {
    let identity = issuer(config)?
        .resolve_access(token)
        .await
        .context("failed to resolve access token")?;

    Ok(serde_json::to_string_pretty(&identity)?)
}

/// # Errors
/// Returns an error if the refresh token is invalid, already used or the
/// new pair cannot be stored.
#[instrument(skip_all)]
pub async fn refresh(config: &IssuerConfig, token: &str) -> Result<String> {
    let pair = issuer(config)?
        .refresh_session(token)
        .await
        .context("failed to refresh session")?;

    Ok(serde_json::to_string_pretty(&pair)?)
}

/// # Errors
/// Returns an error if the store rejects the delete.
#[instrument(skip_all, fields(count = session_ids.len()))]
pub async fn revoke(config: &IssuerConfig, session_ids: &[String]) -> Result<String> {
    let revoked = issuer(config)?
        .revoke(session_ids)
        .await
        .context("failed to revoke sessions")?;

    Ok(serde_json::to_string_pretty(&json!({ "revoked": revoked }))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{AccessClaims, RefreshClaims};
    use secrecy::SecretString;

    fn config() -> IssuerConfig {
        IssuerConfig::new(SecretString::from("a-secret"), SecretString::from("r-secret"))
            .with_store_url("memory://".to_string())
    }

    #[test]
    fn verify_prints_access_claims() -> Result<()> {
        let signer = TokenSigner::new(SecretString::from("a-secret"), SecretString::from("r-secret"));
        let exp = SystemClock.unix_seconds() + 60;
        let token = signer.sign_access(&AccessClaims::new("abc", exp))?;

        let output: serde_json::Value = serde_json::from_str(&verify(&config(), &token, false)?)?;
        assert_eq!(output["uuid"], "abc");
        assert_eq!(output["authorized"], true);
        assert_eq!(output["exp"], exp);
        Ok(())
    }

    #[test]
    fn verify_refresh_rejects_access_token() -> Result<()> {
        let signer = TokenSigner::new(SecretString::from("a-secret"), SecretString::from("r-secret"));
        let exp = SystemClock.unix_seconds() + 60;
        let access = signer.sign_access(&AccessClaims::new("abc", exp))?;
        let refresh = signer.sign_refresh(&RefreshClaims::new("def", exp))?;

        assert!(verify(&config(), &access, true).is_err());
        assert!(verify(&config(), &refresh, true).is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn issue_with_memory_store() -> Result<()> {
        let identity = Identity::new("u1", "alice", "a@x.com", "555");
        let output: serde_json::Value =
            serde_json::from_str(&issue(&config(), &identity).await?)?;

        assert!(output["access_token"].is_string());
        assert!(output["refresh_token"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn revoke_unknown_ids() -> Result<()> {
        let output: serde_json::Value =
            serde_json::from_str(&revoke(&config(), &["missing".to_string()]).await?)?;
        assert_eq!(output["revoked"], 0);
        Ok(())
    }
}
